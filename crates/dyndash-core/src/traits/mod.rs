//! Component traits for the dyndash system
//!
//! - [`DnsProvider`]: remote DNS management API adapter
//! - [`IpResolver`]: current-address lookup for an interface/mode pair
//! - [`BindingStore`]: persistent record-id → binding mapping

pub mod binding_store;
pub mod dns_provider;
pub mod ip_resolver;

pub use binding_store::{Binding, BindingStore, IpMode};
pub use dns_provider::{DnsProvider, ProviderRecord, RecordPage, SharedProvider};
pub use ip_resolver::IpResolver;
