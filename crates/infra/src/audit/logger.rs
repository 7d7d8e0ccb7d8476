use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use countops_events::Event;

use super::entry::AuditEntry;
use super::fallback::{
    AlertChannel, AuditAlert, FallbackSink, TracingAlertChannel, TracingFallbackSink,
};
use super::r#trait::{AuditStore, AuditStoreError};

/// Default bound on the durable write.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_millis(2_000);

/// What happened to an audit entry.
///
/// None of these variants is a failure of the caller's operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditOutcome {
    /// Written to the durable store.
    Persisted,
    /// The durable write failed; the entry is in the fallback channel.
    Degraded { reason: String },
    /// Both the durable write and the fallback failed; an alert was raised.
    Lost { reason: String },
}

impl AuditOutcome {
    pub fn is_persisted(&self) -> bool {
        matches!(self, AuditOutcome::Persisted)
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, AuditOutcome::Degraded { .. })
    }

    pub fn is_lost(&self) -> bool {
        matches!(self, AuditOutcome::Lost { .. })
    }
}

/// Snapshot of the logger's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AuditStats {
    pub persisted: u64,
    pub degraded: u64,
    pub lost: u64,
}

#[derive(Debug, Default)]
struct Counters {
    persisted: AtomicU64,
    degraded: AtomicU64,
    lost: AtomicU64,
}

/// Audit logger: durable write first, fallback second, alert last.
///
/// ## Guarantees
///
/// - `log` always completes; the caller's business operation is never rolled
///   back or reported as failed because auditing degraded.
/// - An entry handed to `log` is either durably persisted or captured by the
///   fallback sink. If neither works, the loss is escalated through the alert
///   channel and counted in [`AuditStats::lost`].
///
/// The durable write is bounded by `write_timeout`, which requires a Tokio
/// runtime with the time driver enabled.
#[derive(Debug)]
pub struct AuditLogger<S, F = TracingFallbackSink, A = TracingAlertChannel> {
    store: S,
    fallback: F,
    alerts: A,
    write_timeout: Duration,
    counters: Counters,
}

impl<S> AuditLogger<S>
where
    S: AuditStore,
{
    /// Logger with the tracing-backed fallback and alert channels.
    pub fn new(store: S) -> Self {
        Self {
            store,
            fallback: TracingFallbackSink,
            alerts: TracingAlertChannel,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            counters: Counters::default(),
        }
    }
}

impl<S, F, A> AuditLogger<S, F, A>
where
    S: AuditStore,
    F: FallbackSink,
    A: AlertChannel,
{
    pub fn with_fallback<F2: FallbackSink>(self, fallback: F2) -> AuditLogger<S, F2, A> {
        AuditLogger {
            store: self.store,
            fallback,
            alerts: self.alerts,
            write_timeout: self.write_timeout,
            counters: self.counters,
        }
    }

    pub fn with_alerts<A2: AlertChannel>(self, alerts: A2) -> AuditLogger<S, F, A2> {
        AuditLogger {
            store: self.store,
            fallback: self.fallback,
            alerts,
            write_timeout: self.write_timeout,
            counters: self.counters,
        }
    }

    pub fn with_write_timeout(mut self, write_timeout: Duration) -> Self {
        self.write_timeout = write_timeout;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Record an audit entry. Never fails from the caller's point of view.
    pub async fn log(&self, entry: AuditEntry) -> AuditOutcome {
        let written = match tokio::time::timeout(self.write_timeout, self.store.append(&entry)).await
        {
            Ok(result) => result,
            Err(_) => Err(AuditStoreError::Timeout(self.write_timeout)),
        };

        match written {
            Ok(()) => {
                self.counters.persisted.fetch_add(1, Ordering::Relaxed);
                debug!(
                    entity_name = entry.entity_name(),
                    entity_id = entry.entity_id(),
                    event_type = entry.event_type(),
                    "audit entry persisted"
                );
                AuditOutcome::Persisted
            }
            Err(err) => self.degrade(&entry, &err),
        }
    }

    /// Convenience wrapper: build the entry from a typed event, then [`log`](Self::log) it.
    pub async fn log_event<E>(&self, event: &E) -> AuditOutcome
    where
        E: Event + Serialize,
    {
        self.log(AuditEntry::from_event(event)).await
    }

    pub fn stats(&self) -> AuditStats {
        AuditStats {
            persisted: self.counters.persisted.load(Ordering::Relaxed),
            degraded: self.counters.degraded.load(Ordering::Relaxed),
            lost: self.counters.lost.load(Ordering::Relaxed),
        }
    }

    fn degrade(&self, entry: &AuditEntry, err: &AuditStoreError) -> AuditOutcome {
        let reason = err.to_string();

        match self.fallback.record(entry, &reason) {
            Ok(()) => {
                self.counters.degraded.fetch_add(1, Ordering::Relaxed);
                AuditOutcome::Degraded { reason }
            }
            Err(fallback_err) => {
                self.counters.lost.fetch_add(1, Ordering::Relaxed);
                self.alerts
                    .raise(&AuditAlert::new(entry, &reason, &fallback_err));
                AuditOutcome::Lost {
                    reason: format!("{reason}; {fallback_err}"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Utc;

    use crate::audit::fallback::{MemoryAlertChannel, MemoryFallbackSink};
    use crate::audit::in_memory::InMemoryAuditStore;

    fn entry() -> AuditEntry {
        AuditEntry::new(
            "CountRun",
            "run-42",
            "count_run.started",
            serde_json::json!({ "operator": "alice" }),
            Utc::now(),
        )
    }

    /// Store whose append never completes.
    struct HangingStore;

    #[async_trait::async_trait]
    impl AuditStore for HangingStore {
        async fn append(&self, _entry: &AuditEntry) -> Result<(), AuditStoreError> {
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn persists_when_store_is_available() {
        let store = Arc::new(InMemoryAuditStore::new());
        let fallback = Arc::new(MemoryFallbackSink::new());
        let logger = AuditLogger::new(store.clone()).with_fallback(fallback.clone());

        let outcome = logger.log(entry()).await;

        assert_eq!(outcome, AuditOutcome::Persisted);
        let stored = store.entries();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].entity_id(), "run-42");
        assert!(fallback.records().is_empty());
        assert_eq!(logger.stats().persisted, 1);
    }

    #[tokio::test]
    async fn storage_unavailable_degrades_to_exactly_one_fallback_record() {
        let store = Arc::new(InMemoryAuditStore::new());
        store.set_available(false);
        let fallback = Arc::new(MemoryFallbackSink::new());
        let alerts = Arc::new(MemoryAlertChannel::new());
        let logger = AuditLogger::new(store.clone())
            .with_fallback(fallback.clone())
            .with_alerts(alerts.clone());

        let outcome = logger.log(entry()).await;

        assert!(outcome.is_degraded());
        let records = fallback.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].entry.entity_id(), "run-42");
        assert_eq!(records[0].entry.event_type(), "count_run.started");
        assert!(records[0].reason.contains("unavailable"), "{}", records[0].reason);
        assert!(store.entries().is_empty());
        assert!(alerts.alerts().is_empty());
        assert_eq!(
            logger.stats(),
            AuditStats {
                persisted: 0,
                degraded: 1,
                lost: 0
            }
        );
    }

    #[tokio::test]
    async fn slow_store_times_out_into_fallback() {
        let fallback = Arc::new(MemoryFallbackSink::new());
        let logger = AuditLogger::new(HangingStore)
            .with_fallback(fallback.clone())
            .with_write_timeout(Duration::from_millis(20));

        let outcome = logger.log(entry()).await;

        match outcome {
            AuditOutcome::Degraded { reason } => assert!(reason.contains("timed out"), "{reason}"),
            other => panic!("expected degraded, got {other:?}"),
        }
        assert_eq!(fallback.records().len(), 1);
    }

    #[tokio::test]
    async fn fallback_failure_raises_alert() {
        let store = Arc::new(InMemoryAuditStore::new());
        store.set_available(false);
        let fallback = Arc::new(MemoryFallbackSink::new());
        fallback.set_failing(true);
        let alerts = Arc::new(MemoryAlertChannel::new());
        let logger = AuditLogger::new(store)
            .with_fallback(fallback.clone())
            .with_alerts(alerts.clone());

        let outcome = logger.log(entry()).await;

        assert!(outcome.is_lost());
        let raised = alerts.alerts();
        assert_eq!(raised.len(), 1);
        assert_eq!(raised[0].entity_id, "run-42");
        assert_eq!(raised[0].event_type, "count_run.started");
        assert_eq!(logger.stats().lost, 1);
    }

    #[tokio::test]
    async fn tracing_channels_never_fail() {
        let store = Arc::new(InMemoryAuditStore::new());
        store.set_available(false);
        let logger = AuditLogger::new(store);

        assert!(logger.log(entry()).await.is_degraded());
    }
}
