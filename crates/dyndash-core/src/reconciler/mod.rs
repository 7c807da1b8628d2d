//! Reconciliation engine
//!
//! The Reconciler is responsible for:
//! - Resolving the current IP for every binding via IpResolver
//! - Comparing against the last confirmed IP in the BindingStore
//! - Pushing changed addresses via DnsProvider
//! - Persisting state after confirmed updates
//!
//! ## Control Flow
//!
//! ```text
//! timer tick
//!     │
//!     ▼
//! ┌──────────────┐   per binding    ┌─────────────┐
//! │  Reconciler  │────────────────▶ │ IpResolver  │
//! └──────────────┘                  └─────────────┘
//!     │        │
//!     │ changed│ unchanged: no side effects
//!     ▼        ▼
//! ┌─────────────┐           ┌──────────────┐
//! │ DnsProvider │──confirm─▶│ BindingStore │
//! │ (update)    │           │ (write-through)
//! └─────────────┘           └──────────────┘
//! ```
//!
//! The single load-bearing invariant: a binding's `last_ip` is advanced
//! only after the provider confirmed the write. A failed push leaves the
//! comparison input untouched, so the next tick is a full, independent
//! retry with the same target value.

use crate::traits::{Binding, BindingStore, DnsProvider, IpResolver, SharedProvider};
use crate::error::Result;
use serde::Serialize;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Managed records are always A records
const RECORD_TYPE: &str = "A";

/// Capacity of the event channel; overflow drops events with a warning
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Events emitted by the Reconciler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcilerEvent {
    /// A reconciliation pass started
    TickStarted {
        bindings: usize,
    },

    /// A record was pushed to the provider and confirmed
    UpdateSucceeded {
        record_id: String,
        fqdn: String,
        new_ip: Ipv4Addr,
        previous_ip: Option<Ipv4Addr>,
    },

    /// Resolved IP matched the last confirmed IP; nothing was called
    UpdateSkipped {
        record_id: String,
        current_ip: Ipv4Addr,
    },

    /// The provider rejected or failed the update
    UpdateFailed {
        record_id: String,
        fqdn: String,
        error: String,
    },

    /// No IP could be determined for the binding's interface/mode
    ResolveFailed {
        record_id: String,
        interface: String,
    },

    /// A reconciliation pass finished
    TickFinished {
        summary: TickSummary,
    },
}

/// Outcome counts for one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TickSummary {
    /// Bindings examined
    pub checked: usize,
    /// Provider updates confirmed
    pub updated: usize,
    /// Bindings whose IP had not changed
    pub unchanged: usize,
    /// Resolution or provider failures (retried next tick)
    pub failed: usize,
}

/// Per-binding outcome of one reconciliation step
enum BindingOutcome {
    Updated,
    Unchanged,
    Failed,
}

/// Reconciliation engine
///
/// Runs one pass over all bindings on a fixed interval. Passes never
/// overlap: the timer and the manual [`Reconciler::reconcile_once`] entry
/// point share one run lock, so a pass that runs long simply delays the
/// next one.
pub struct Reconciler {
    /// Handle to the configured DNS provider (may be unconfigured)
    provider: SharedProvider,

    /// Current-address lookup
    resolver: Arc<dyn IpResolver>,

    /// Shared binding store (also mutated by the web layer)
    store: Arc<dyn BindingStore>,

    /// Fixed tick interval
    interval: Duration,

    /// Serializes passes from the timer and manual triggers
    run_lock: Mutex<()>,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<ReconcilerEvent>,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// Returns the reconciler plus a receiver yielding [`ReconcilerEvent`]s
    /// for logging and tests.
    pub fn new(
        provider: SharedProvider,
        resolver: Arc<dyn IpResolver>,
        store: Arc<dyn BindingStore>,
        interval: Duration,
    ) -> (Self, mpsc::Receiver<ReconcilerEvent>) {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let reconciler = Self {
            provider,
            resolver,
            store,
            interval,
            run_lock: Mutex::new(()),
            event_tx: tx,
        };

        (reconciler, rx)
    }

    /// Run the timer loop until a shutdown signal arrives
    ///
    /// The first pass runs immediately; subsequent passes follow the fixed
    /// interval. Missed ticks are never queued: if the process was asleep
    /// or a pass ran long, the skipped tick simply does not happen.
    pub async fn run(&self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Run with an explicit shutdown channel instead of OS signals.
    ///
    /// Used by the daemon (which owns signal handling) and by tests that
    /// need deterministic shutdown.
    pub async fn run_with_shutdown(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }

    async fn run_internal(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "reconciler started, checking every {}s",
            self.interval.as_secs()
        );

        if let Some(mut rx) = shutdown_rx {
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = self.reconcile_once().await {
                            // Never fatal: whatever failed is retried next tick
                            error!("reconciliation pass failed: {}", e);
                        }
                    }

                    _ = &mut rx => {
                        info!("shutdown signal received");
                        break;
                    }
                }
            }
        } else {
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = self.reconcile_once().await {
                            error!("reconciliation pass failed: {}", e);
                        }
                    }

                    _ = tokio::signal::ctrl_c() => {
                        info!("shutdown signal received");
                        break;
                    }
                }
            }
        }

        self.store.flush().await?;
        info!("binding store flushed, reconciler stopped");
        Ok(())
    }

    /// Run one full reconciliation pass immediately.
    ///
    /// This is the entry point behind the dashboard's manual refresh. It
    /// takes the same run lock as the timer, so a manual pass and a timer
    /// tick never interleave.
    pub async fn reconcile_once(&self) -> Result<TickSummary> {
        let _guard = self.run_lock.lock().await;

        let provider = match self.provider.get() {
            Ok(p) => p,
            Err(_) => {
                warn!("provider credentials not configured, skipping reconciliation pass");
                return Ok(TickSummary::default());
            }
        };

        let bindings = self.store.all().await?;
        self.emit_event(ReconcilerEvent::TickStarted {
            bindings: bindings.len(),
        });

        let mut summary = TickSummary::default();
        for (record_id, binding) in &bindings {
            summary.checked += 1;
            match self
                .reconcile_binding(provider.as_ref(), record_id, binding)
                .await
            {
                BindingOutcome::Updated => summary.updated += 1,
                BindingOutcome::Unchanged => summary.unchanged += 1,
                BindingOutcome::Failed => summary.failed += 1,
            }
        }

        debug!(
            "reconciliation pass finished: {} checked, {} updated, {} unchanged, {} failed",
            summary.checked, summary.updated, summary.unchanged, summary.failed
        );
        self.emit_event(ReconcilerEvent::TickFinished { summary });

        Ok(summary)
    }

    /// Reconcile a single binding
    ///
    /// Evaluated independently of all other bindings; any failure is local
    /// to this binding and this tick.
    async fn reconcile_binding(
        &self,
        provider: &dyn DnsProvider,
        record_id: &str,
        binding: &Binding,
    ) -> BindingOutcome {
        let current = match self
            .resolver
            .resolve(&binding.interface, binding.ip_mode)
            .await
        {
            Ok(ip) => ip,
            Err(e) => {
                warn!(
                    "no IP for interface {} ({}): {}, skipping {}",
                    binding.interface,
                    binding.ip_mode.label(),
                    e,
                    binding.fqdn()
                );
                self.emit_event(ReconcilerEvent::ResolveFailed {
                    record_id: record_id.to_string(),
                    interface: binding.interface.clone(),
                });
                return BindingOutcome::Failed;
            }
        };

        // Common case: nothing changed, nothing is called.
        if binding.last_ip == Some(current) {
            debug!("{} unchanged ({})", binding.fqdn(), current);
            self.emit_event(ReconcilerEvent::UpdateSkipped {
                record_id: record_id.to_string(),
                current_ip: current,
            });
            return BindingOutcome::Unchanged;
        }

        match provider
            .update_record(record_id, &binding.rr, RECORD_TYPE, &current.to_string())
            .await
        {
            Ok(()) => {
                // The provider confirmed the write; only now may last_ip move.
                if let Err(e) = self.store.mark_updated(record_id, current).await {
                    error!(
                        "updated {} but failed to persist binding state: {}",
                        binding.fqdn(),
                        e
                    );
                }

                info!(
                    "updated {} -> {} (was {})",
                    binding.fqdn(),
                    current,
                    binding
                        .last_ip
                        .map(|ip| ip.to_string())
                        .unwrap_or_else(|| "unset".to_string())
                );
                self.emit_event(ReconcilerEvent::UpdateSucceeded {
                    record_id: record_id.to_string(),
                    fqdn: binding.fqdn(),
                    new_ip: current,
                    previous_ip: binding.last_ip,
                });
                BindingOutcome::Updated
            }
            Err(e) => {
                // last_ip stays put so the next tick retries the same target.
                error!("failed to update {}: {}", binding.fqdn(), e);
                self.emit_event(ReconcilerEvent::UpdateFailed {
                    record_id: record_id.to_string(),
                    fqdn: binding.fqdn(),
                    error: e.to_string(),
                });
                BindingOutcome::Failed
            }
        }
    }

    /// Emit a reconciler event
    fn emit_event(&self, event: ReconcilerEvent) {
        if self.event_tx.try_send(event).is_err() {
            warn!("event channel full, dropping reconciler event");
        }
    }
}
