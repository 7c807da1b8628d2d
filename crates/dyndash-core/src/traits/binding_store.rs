// # Binding Store Trait
//
// A binding associates one provider DNS record with the interface and mode
// used to keep it current. The store is a flat mapping from record id to
// binding; the presence of an entry is what marks a record as managed.
//
// ## Implementations
//
// - File-based JSON store (write-through, atomic renames): `store::file`
// - In-memory store for tests: `store::memory`

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// How the current address for a binding is determined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IpMode {
    /// First IPv4 address bound to the interface itself
    InterfaceIp,
    /// Public egress address as seen from the internet through the interface
    PublicIp,
}

impl IpMode {
    /// Human-readable label used by the UI
    pub fn label(&self) -> &'static str {
        match self {
            IpMode::InterfaceIp => "interface IP",
            IpMode::PublicIp => "public egress IP",
        }
    }
}

/// One DNS record under dynamic-DNS management.
///
/// The provider-assigned record id is the store key and is not duplicated
/// in the serialized value, keeping the on-disk shape a plain
/// `{ "<record_id>": { ... } }` map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    /// Root domain name (e.g. "example.com")
    pub domain: String,

    /// Host label being updated (e.g. "home")
    pub rr: String,

    /// Local network interface the address is derived from
    pub interface: String,

    /// Address derivation mode
    pub ip_mode: IpMode,

    /// Last IPv4 value confirmed written to the provider.
    ///
    /// Only ever advanced after a successful provider call; a fresh binding
    /// has no last IP and is updated on the first tick.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_ip: Option<Ipv4Addr>,

    /// Timestamp of the last confirmed update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<DateTime<Utc>>,
}

impl Binding {
    /// Create a binding that has never been reconciled
    pub fn new(
        domain: impl Into<String>,
        rr: impl Into<String>,
        interface: impl Into<String>,
        ip_mode: IpMode,
    ) -> Self {
        Self {
            domain: domain.into(),
            rr: rr.into(),
            interface: interface.into(),
            ip_mode,
            last_ip: None,
            update_time: None,
        }
    }

    /// Fully qualified name of the record ("rr.domain"), for log messages
    pub fn fqdn(&self) -> String {
        format!("{}.{}", self.rr, self.domain)
    }
}

/// Trait for binding store implementations
///
/// All methods must be safe to call concurrently: the reconciler and the
/// web handlers share one store instance. Implementations guard their state
/// internally; callers never coordinate.
#[async_trait]
pub trait BindingStore: Send + Sync {
    /// Fetch the binding for a record id, if managed
    async fn get(&self, record_id: &str) -> Result<Option<Binding>, crate::Error>;

    /// Create or replace the binding for a record id
    async fn upsert(&self, record_id: &str, binding: &Binding) -> Result<(), crate::Error>;

    /// Remove the binding for a record id (no error if absent)
    async fn remove(&self, record_id: &str) -> Result<(), crate::Error>;

    /// Snapshot of all bindings as (record id, binding) pairs
    async fn all(&self) -> Result<Vec<(String, Binding)>, crate::Error>;

    /// Record a confirmed provider write: set `last_ip` and stamp
    /// `update_time`, persisting immediately.
    ///
    /// Must only be called after the provider confirmed the update. If the
    /// binding was removed in the meantime the call is a no-op; the
    /// deletion wins.
    async fn mark_updated(&self, record_id: &str, ip: Ipv4Addr) -> Result<(), crate::Error>;

    /// Persist any pending changes
    async fn flush(&self) -> Result<(), crate::Error>;
}
