//! Reconciler idempotency tests
//!
//! Verifies the no-op guarantee: a binding whose resolved IP equals the
//! last confirmed IP must cause zero provider calls, and a changed IP must
//! cause exactly one.

mod common;

use common::*;
use dyndash_core::traits::{Binding, BindingStore, IpMode, SharedProvider};
use dyndash_core::{MemoryBindingStore, Reconciler};
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

fn binding_with_last_ip(last_ip: Option<Ipv4Addr>) -> Binding {
    let mut binding = Binding::new("example.com", "home", "eth0", IpMode::InterfaceIp);
    binding.last_ip = last_ip;
    binding
}

#[tokio::test]
async fn unchanged_ip_makes_no_provider_call() {
    let ip: Ipv4Addr = "1.2.3.4".parse().unwrap();
    let provider = Arc::new(CountingProvider::new());
    let resolver = Arc::new(ScriptedResolver::returning(ip));
    let store = Arc::new(MemoryBindingStore::new());

    store
        .upsert("r1", &binding_with_last_ip(Some(ip)))
        .await
        .unwrap();

    let (reconciler, _events) = Reconciler::new(
        SharedProvider::configured(provider.clone()),
        resolver.clone(),
        store.clone(),
        Duration::from_secs(600),
    );

    let summary = reconciler.reconcile_once().await.unwrap();

    assert_eq!(provider.update_count(), 0, "unchanged IP must not hit the provider");
    assert_eq!(summary.checked, 1);
    assert_eq!(summary.unchanged, 1);
    assert_eq!(resolver.call_count(), 1);
}

#[tokio::test]
async fn changed_ip_makes_exactly_one_update_with_new_value() {
    let old_ip: Ipv4Addr = "1.2.3.4".parse().unwrap();
    let new_ip: Ipv4Addr = "5.6.7.8".parse().unwrap();

    let provider = Arc::new(CountingProvider::new());
    let resolver = Arc::new(ScriptedResolver::returning(new_ip));
    let store = Arc::new(MemoryBindingStore::new());

    store
        .upsert("r1", &binding_with_last_ip(Some(old_ip)))
        .await
        .unwrap();

    let (reconciler, _events) = Reconciler::new(
        SharedProvider::configured(provider.clone()),
        resolver,
        store.clone(),
        Duration::from_secs(600),
    );

    let summary = reconciler.reconcile_once().await.unwrap();

    assert_eq!(
        provider.update_calls(),
        vec![("r1".to_string(), "5.6.7.8".to_string())]
    );
    assert_eq!(summary.updated, 1);

    let committed = store.get("r1").await.unwrap().unwrap();
    assert_eq!(committed.last_ip, Some(new_ip));
    assert!(committed.update_time.is_some());
}

#[tokio::test]
async fn first_run_with_no_last_ip_pushes_update() {
    let ip: Ipv4Addr = "10.0.0.7".parse().unwrap();
    let provider = Arc::new(CountingProvider::new());
    let resolver = Arc::new(ScriptedResolver::returning(ip));
    let store = Arc::new(MemoryBindingStore::new());

    store.upsert("r1", &binding_with_last_ip(None)).await.unwrap();

    let (reconciler, _events) = Reconciler::new(
        SharedProvider::configured(provider.clone()),
        resolver,
        store.clone(),
        Duration::from_secs(600),
    );

    reconciler.reconcile_once().await.unwrap();

    assert_eq!(provider.update_count(), 1);
    assert_eq!(store.get("r1").await.unwrap().unwrap().last_ip, Some(ip));
}

#[tokio::test]
async fn second_pass_after_commit_is_a_noop() {
    let new_ip: Ipv4Addr = "5.6.7.8".parse().unwrap();
    let provider = Arc::new(CountingProvider::new());
    let resolver = Arc::new(ScriptedResolver::returning(new_ip));
    let store = Arc::new(MemoryBindingStore::new());

    store.upsert("r1", &binding_with_last_ip(None)).await.unwrap();

    let (reconciler, _events) = Reconciler::new(
        SharedProvider::configured(provider.clone()),
        resolver,
        store.clone(),
        Duration::from_secs(600),
    );

    reconciler.reconcile_once().await.unwrap();
    assert_eq!(provider.update_count(), 1);

    // Same resolved IP again: the committed state suppresses the call
    let summary = reconciler.reconcile_once().await.unwrap();
    assert_eq!(provider.update_count(), 1, "no additional provider call expected");
    assert_eq!(summary.unchanged, 1);
}

#[tokio::test]
async fn bindings_are_reconciled_independently() {
    let shared_ip: Ipv4Addr = "192.168.1.10".parse().unwrap();
    let changed_ip: Ipv4Addr = "203.0.113.9".parse().unwrap();

    let provider = Arc::new(CountingProvider::new());
    let resolver = Arc::new(ScriptedResolver::returning(shared_ip));
    resolver.set_for_interface("ppp0", changed_ip);
    let store = Arc::new(MemoryBindingStore::new());

    // eth0 binding is already current, ppp0 binding is stale
    store
        .upsert("r-eth", &binding_with_last_ip(Some(shared_ip)))
        .await
        .unwrap();
    let mut stale = Binding::new("example.com", "office", "ppp0", IpMode::PublicIp);
    stale.last_ip = Some("198.51.100.1".parse().unwrap());
    store.upsert("r-ppp", &stale).await.unwrap();

    let (reconciler, _events) = Reconciler::new(
        SharedProvider::configured(provider.clone()),
        resolver,
        store.clone(),
        Duration::from_secs(600),
    );

    let summary = reconciler.reconcile_once().await.unwrap();

    assert_eq!(summary.checked, 2);
    assert_eq!(summary.unchanged, 1);
    assert_eq!(summary.updated, 1);
    assert_eq!(
        provider.update_calls(),
        vec![("r-ppp".to_string(), "203.0.113.9".to_string())]
    );
}
