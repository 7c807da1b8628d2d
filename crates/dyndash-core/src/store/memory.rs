// # Memory Binding Store
//
// In-memory implementation of BindingStore. Nothing survives a restart;
// every binding looks never-updated on the next run and gets pushed on the
// first tick. Intended for tests and throwaway deployments.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::binding_store::{Binding, BindingStore};

/// In-memory binding store implementation
#[derive(Debug, Clone, Default)]
pub struct MemoryBindingStore {
    inner: Arc<RwLock<HashMap<String, Binding>>>,
}

impl MemoryBindingStore {
    /// Create a new empty memory binding store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of bindings in the store
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl BindingStore for MemoryBindingStore {
    async fn get(&self, record_id: &str) -> Result<Option<Binding>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.get(record_id).cloned())
    }

    async fn upsert(&self, record_id: &str, binding: &Binding) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.insert(record_id.to_string(), binding.clone());
        Ok(())
    }

    async fn remove(&self, record_id: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.remove(record_id);
        Ok(())
    }

    async fn all(&self) -> Result<Vec<(String, Binding)>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }

    async fn mark_updated(&self, record_id: &str, ip: Ipv4Addr) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        if let Some(binding) = guard.get_mut(record_id) {
            binding.last_ip = Some(ip);
            binding.update_time = Some(chrono::Utc::now());
        }
        Ok(())
    }

    async fn flush(&self) -> Result<(), Error> {
        // No-op for memory store (everything is already "persisted")
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::IpMode;

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryBindingStore::new();
        assert!(store.is_empty().await);

        let binding = Binding::new("example.com", "home", "eth0", IpMode::InterfaceIp);
        store.upsert("r1", &binding).await.unwrap();
        assert_eq!(store.len().await, 1);

        let retrieved = store.get("r1").await.unwrap().unwrap();
        assert_eq!(retrieved.fqdn(), "home.example.com");
        assert!(retrieved.last_ip.is_none());

        store.remove("r1").await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_mark_updated_stamps_ip_and_time() {
        let store = MemoryBindingStore::new();
        let binding = Binding::new("example.com", "home", "eth0", IpMode::PublicIp);
        store.upsert("r1", &binding).await.unwrap();

        let ip: Ipv4Addr = "1.2.3.4".parse().unwrap();
        store.mark_updated("r1", ip).await.unwrap();

        let updated = store.get("r1").await.unwrap().unwrap();
        assert_eq!(updated.last_ip, Some(ip));
        assert!(updated.update_time.is_some());
    }

    #[tokio::test]
    async fn test_mark_updated_on_removed_binding_is_noop() {
        let store = MemoryBindingStore::new();
        let ip: Ipv4Addr = "1.2.3.4".parse().unwrap();
        store.mark_updated("gone", ip).await.unwrap();
        assert!(store.get("gone").await.unwrap().is_none());
    }
}
