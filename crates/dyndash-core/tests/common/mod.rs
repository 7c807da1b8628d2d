//! Test doubles shared by the reconciler integration tests
//!
//! A call-counting provider stub and a scripted resolver; together they let
//! the tests assert exactly which provider calls a reconciliation pass
//! makes.

use async_trait::async_trait;
use dyndash_core::error::Result;
use dyndash_core::traits::{DnsProvider, IpMode, IpResolver, ProviderRecord, RecordPage};
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// A DnsProvider stub that records every update call and can be switched
/// into a failing mode.
pub struct CountingProvider {
    update_calls: Mutex<Vec<(String, String)>>,
    fail_updates: AtomicBool,
}

impl CountingProvider {
    pub fn new() -> Self {
        Self {
            update_calls: Mutex::new(Vec::new()),
            fail_updates: AtomicBool::new(false),
        }
    }

    /// Make every subsequent update_record call fail (or succeed again)
    pub fn set_fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    /// Number of update_record calls seen so far
    pub fn update_count(&self) -> usize {
        self.update_calls.lock().unwrap().len()
    }

    /// All (record_id, value) pairs passed to update_record, in order
    pub fn update_calls(&self) -> Vec<(String, String)> {
        self.update_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DnsProvider for CountingProvider {
    async fn list_domains(&self) -> Result<Vec<String>> {
        Ok(vec!["example.com".to_string()])
    }

    async fn list_records(&self, _domain: &str, _page: u64, _page_size: u64) -> Result<RecordPage> {
        Ok(RecordPage {
            records: vec![ProviderRecord {
                id: "r1".to_string(),
                rr: "home".to_string(),
                record_type: "A".to_string(),
                value: "1.2.3.4".to_string(),
                update_timestamp_ms: None,
            }],
            total_count: 1,
        })
    }

    async fn add_record(
        &self,
        _domain: &str,
        _rr: &str,
        _record_type: &str,
        _value: &str,
        _ttl: u32,
    ) -> Result<String> {
        Ok("new-record-id".to_string())
    }

    async fn update_record(
        &self,
        record_id: &str,
        _rr: &str,
        _record_type: &str,
        value: &str,
    ) -> Result<()> {
        self.update_calls
            .lock()
            .unwrap()
            .push((record_id.to_string(), value.to_string()));

        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(dyndash_core::Error::provider(
                "stub",
                "simulated provider failure",
            ));
        }
        Ok(())
    }

    async fn delete_record(&self, _record_id: &str) -> Result<()> {
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "stub"
    }
}

/// An IpResolver whose answers the test controls per interface
pub struct ScriptedResolver {
    default: Mutex<std::result::Result<Ipv4Addr, String>>,
    per_interface: Mutex<HashMap<String, std::result::Result<Ipv4Addr, String>>>,
    call_count: AtomicUsize,
}

impl ScriptedResolver {
    /// Resolver that answers `ip` for every interface
    pub fn returning(ip: Ipv4Addr) -> Self {
        Self {
            default: Mutex::new(Ok(ip)),
            per_interface: Mutex::new(HashMap::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    /// Resolver that fails for every interface
    pub fn failing(msg: &str) -> Self {
        Self {
            default: Mutex::new(Err(msg.to_string())),
            per_interface: Mutex::new(HashMap::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    /// Change the default answer
    pub fn set(&self, ip: Ipv4Addr) {
        *self.default.lock().unwrap() = Ok(ip);
    }

    /// Pin an answer for one interface
    pub fn set_for_interface(&self, interface: &str, ip: Ipv4Addr) {
        self.per_interface
            .lock()
            .unwrap()
            .insert(interface.to_string(), Ok(ip));
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IpResolver for ScriptedResolver {
    async fn resolve(&self, interface: &str, _mode: IpMode) -> Result<Ipv4Addr> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        let answer = self
            .per_interface
            .lock()
            .unwrap()
            .get(interface)
            .cloned()
            .unwrap_or_else(|| self.default.lock().unwrap().clone());

        answer.map_err(dyndash_core::Error::resolve)
    }
}
