//! Reconciler failure-path tests
//!
//! A failed push must leave the committed state untouched so the next pass
//! retries with the same target; a resolution failure must leave the
//! binding completely untouched; an unconfigured provider must short-
//! circuit the whole pass without any calls.

mod common;

use common::*;
use dyndash_core::traits::{Binding, BindingStore, IpMode, SharedProvider};
use dyndash_core::{MemoryBindingStore, Reconciler};
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn failed_update_keeps_last_ip_and_retries_same_target() {
    let old_ip: Ipv4Addr = "1.2.3.4".parse().unwrap();
    let new_ip: Ipv4Addr = "5.6.7.8".parse().unwrap();

    let provider = Arc::new(CountingProvider::new());
    provider.set_fail_updates(true);
    let resolver = Arc::new(ScriptedResolver::returning(new_ip));
    let store = Arc::new(MemoryBindingStore::new());

    let mut binding = Binding::new("example.com", "home", "eth0", IpMode::InterfaceIp);
    binding.last_ip = Some(old_ip);
    store.upsert("r1", &binding).await.unwrap();

    let (reconciler, _events) = Reconciler::new(
        SharedProvider::configured(provider.clone()),
        resolver,
        store.clone(),
        Duration::from_secs(600),
    );

    let summary = reconciler.reconcile_once().await.unwrap();
    assert_eq!(summary.failed, 1);

    // Committed state must not move on a failed push
    let after_failure = store.get("r1").await.unwrap().unwrap();
    assert_eq!(after_failure.last_ip, Some(old_ip));
    assert!(after_failure.update_time.is_none());

    // Next pass is an independent full attempt with the same target value
    reconciler.reconcile_once().await.unwrap();
    assert_eq!(
        provider.update_calls(),
        vec![
            ("r1".to_string(), "5.6.7.8".to_string()),
            ("r1".to_string(), "5.6.7.8".to_string()),
        ]
    );

    // Once the provider recovers, the same pass commits
    provider.set_fail_updates(false);
    let summary = reconciler.reconcile_once().await.unwrap();
    assert_eq!(summary.updated, 1);
    let committed = store.get("r1").await.unwrap().unwrap();
    assert_eq!(committed.last_ip, Some(new_ip));
    assert!(committed.update_time.is_some());
}

#[tokio::test]
async fn resolve_failure_leaves_binding_untouched() {
    let provider = Arc::new(CountingProvider::new());
    let resolver = Arc::new(ScriptedResolver::failing("interface wg9 not found"));
    let store = Arc::new(MemoryBindingStore::new());

    let mut binding = Binding::new("example.com", "home", "wg9", IpMode::InterfaceIp);
    binding.last_ip = Some("1.2.3.4".parse().unwrap());
    store.upsert("r1", &binding).await.unwrap();

    let (reconciler, _events) = Reconciler::new(
        SharedProvider::configured(provider.clone()),
        resolver,
        store.clone(),
        Duration::from_secs(600),
    );

    let summary = reconciler.reconcile_once().await.unwrap();

    assert_eq!(provider.update_count(), 0, "no provider call on resolution failure");
    assert_eq!(summary.failed, 1);

    let untouched = store.get("r1").await.unwrap().unwrap();
    assert_eq!(untouched, binding, "binding must be byte-for-byte untouched");
}

#[tokio::test]
async fn unconfigured_provider_skips_whole_pass() {
    let resolver = Arc::new(ScriptedResolver::returning("5.6.7.8".parse().unwrap()));
    let store = Arc::new(MemoryBindingStore::new());

    let binding = Binding::new("example.com", "home", "eth0", IpMode::InterfaceIp);
    store.upsert("r1", &binding).await.unwrap();

    let (reconciler, _events) = Reconciler::new(
        SharedProvider::unconfigured(),
        resolver.clone(),
        store.clone(),
        Duration::from_secs(600),
    );

    let summary = reconciler.reconcile_once().await.unwrap();

    assert_eq!(summary.checked, 0, "pass is skipped entirely without credentials");
    assert_eq!(resolver.call_count(), 0, "no resolution is attempted either");
    assert_eq!(store.get("r1").await.unwrap().unwrap(), binding);
}

#[tokio::test]
async fn persisted_failure_state_is_not_sticky() {
    // A binding that failed on one pass competes on equal terms next pass:
    // no error counters, no backoff.
    let new_ip: Ipv4Addr = "5.6.7.8".parse().unwrap();
    let provider = Arc::new(CountingProvider::new());
    let resolver = Arc::new(ScriptedResolver::returning(new_ip));
    let store = Arc::new(MemoryBindingStore::new());

    store
        .upsert(
            "r1",
            &Binding::new("example.com", "home", "eth0", IpMode::InterfaceIp),
        )
        .await
        .unwrap();

    let (reconciler, _events) = Reconciler::new(
        SharedProvider::configured(provider.clone()),
        resolver,
        store.clone(),
        Duration::from_secs(600),
    );

    provider.set_fail_updates(true);
    for _ in 0..3 {
        reconciler.reconcile_once().await.unwrap();
    }
    assert_eq!(provider.update_count(), 3, "every pass is a fresh attempt");
}
