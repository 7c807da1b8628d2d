// # DNS Provider Trait
//
// Defines the interface to the remote DNS management API.
//
// ## Implementations
//
// - Alibaba Cloud DNS: `dyndash-provider-alidns` crate
//
// Providers are thin adapters: one API call per method, full error
// propagation, no retry logic and no caching. Whether an update is needed
// at all is decided by the reconciler, never here.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

/// A DNS record as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRecord {
    /// Provider-assigned record id
    pub id: String,
    /// Host label ("RR")
    pub rr: String,
    /// Record type ("A", "CNAME", ...)
    pub record_type: String,
    /// Record value
    pub value: String,
    /// Last provider-side update, milliseconds since epoch
    pub update_timestamp_ms: Option<i64>,
}

/// One page of records plus the total count across all pages
#[derive(Debug, Clone, Default)]
pub struct RecordPage {
    pub records: Vec<ProviderRecord>,
    pub total_count: u64,
}

/// Trait for DNS provider implementations
///
/// Implementations must be thread-safe and usable across async tasks.
/// Every method performs exactly one provider operation and returns the
/// provider's verdict; callers own retry policy.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List all domain names under the account
    async fn list_domains(&self) -> Result<Vec<String>, crate::Error>;

    /// List records for a domain, paginated (1-based page number)
    async fn list_records(
        &self,
        domain: &str,
        page: u64,
        page_size: u64,
    ) -> Result<RecordPage, crate::Error>;

    /// Create a record, returning the provider-assigned record id
    async fn add_record(
        &self,
        domain: &str,
        rr: &str,
        record_type: &str,
        value: &str,
        ttl: u32,
    ) -> Result<String, crate::Error>;

    /// Point an existing record at a new value
    async fn update_record(
        &self,
        record_id: &str,
        rr: &str,
        record_type: &str,
        value: &str,
    ) -> Result<(), crate::Error>;

    /// Delete a record
    async fn delete_record(&self, record_id: &str) -> Result<(), crate::Error>;

    /// Provider name for logging/debugging (e.g. "alidns")
    fn provider_name(&self) -> &'static str;
}

/// Shared, swappable handle to the configured provider.
///
/// Credentials live in the settings file and can change at runtime; the
/// settings handler builds a fresh client and swaps it in here, while the
/// reconciler and the record handlers read through the same handle. While
/// no credentials are configured every access fails fast with
/// [`crate::Error::Unconfigured`] and no network call is made.
#[derive(Clone, Default)]
pub struct SharedProvider {
    inner: Arc<RwLock<Option<Arc<dyn DnsProvider>>>>,
}

impl SharedProvider {
    /// Create an unconfigured handle
    pub fn unconfigured() -> Self {
        Self::default()
    }

    /// Create a handle wrapping an already-built provider
    pub fn configured(provider: Arc<dyn DnsProvider>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(provider))),
        }
    }

    /// Swap the current provider (or clear it with `None`)
    pub fn replace(&self, provider: Option<Arc<dyn DnsProvider>>) {
        *self.inner.write().unwrap() = provider;
    }

    /// Get the current provider, failing fast when unconfigured
    pub fn get(&self) -> Result<Arc<dyn DnsProvider>, crate::Error> {
        self.inner
            .read()
            .unwrap()
            .clone()
            .ok_or(crate::Error::Unconfigured)
    }

    pub fn is_configured(&self) -> bool {
        self.inner.read().unwrap().is_some()
    }
}

impl std::fmt::Debug for SharedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = self
            .inner
            .read()
            .unwrap()
            .as_ref()
            .map(|p| p.provider_name());
        f.debug_struct("SharedProvider").field("provider", &name).finish()
    }
}
