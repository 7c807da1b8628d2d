// # dyndash-core
//
// Core library for the dyndash dynamic DNS dashboard.
//
// ## Architecture Overview
//
// - **IpResolver**: Trait for determining the current address of an
//   interface (directly bound, or as seen from the public internet)
// - **DnsProvider**: Trait for managing records via a provider API
// - **BindingStore**: Persistent mapping from managed record ids to the
//   interface/mode used to keep them current
// - **Reconciler**: Timer-driven engine that pushes changed addresses to
//   the provider and commits state only after confirmed writes
//
// The web dashboard and the daemon binary sit on top of this crate; all
// update logic lives here.

pub mod config;
pub mod error;
pub mod reconciler;
pub mod store;
pub mod traits;

// Re-export core types for convenience
pub use config::AppConfig;
pub use error::{Error, Result};
pub use reconciler::{Reconciler, ReconcilerEvent, TickSummary};
pub use store::{FileBindingStore, MemoryBindingStore};
pub use traits::{Binding, BindingStore, DnsProvider, IpMode, IpResolver, SharedProvider};
