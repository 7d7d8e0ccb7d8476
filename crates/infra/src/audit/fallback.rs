//! Fallback and alert channels for the audit logger.
//!
//! Both channels run on the failure path of an already-failing I/O dependency,
//! so they are synchronous and do not retry.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing::{error, warn};

use super::entry::AuditEntry;

/// The fallback channel could not capture an entry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FallbackError {
    #[error("fallback channel unavailable: {0}")]
    Unavailable(String),
}

/// Synchronous sink for entries whose durable write failed.
pub trait FallbackSink: Send + Sync {
    /// Capture `entry` together with the reason the durable write failed.
    fn record(&self, entry: &AuditEntry, reason: &str) -> Result<(), FallbackError>;
}

/// Process-level alert channel for audit entries that were lost entirely.
pub trait AlertChannel: Send + Sync {
    fn raise(&self, alert: &AuditAlert);
}

/// Writes fallback records to the structured log at warn level.
///
/// Records carry `degraded = true` and the target `countops::audit::fallback`
/// so log pipelines can route them apart from ordinary warnings.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingFallbackSink;

impl FallbackSink for TracingFallbackSink {
    fn record(&self, entry: &AuditEntry, reason: &str) -> Result<(), FallbackError> {
        warn!(
            target: "countops::audit::fallback",
            degraded = true,
            entity_name = entry.entity_name(),
            entity_id = entry.entity_id(),
            event_type = entry.event_type(),
            created_at = %entry.created_at(),
            payload = %entry.payload(),
            reason,
            "audit entry captured in fallback log"
        );
        Ok(())
    }
}

/// A fallback record as kept by [`MemoryFallbackSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackRecord {
    pub entry: AuditEntry,
    pub reason: String,
}

/// Captures fallback records in memory (tests/dev).
#[derive(Debug, Default)]
pub struct MemoryFallbackSink {
    records: Mutex<Vec<FallbackRecord>>,
    failing: AtomicBool,
}

impl MemoryFallbackSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `record` call fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn records(&self) -> Vec<FallbackRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

impl FallbackSink for MemoryFallbackSink {
    fn record(&self, entry: &AuditEntry, reason: &str) -> Result<(), FallbackError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(FallbackError::Unavailable("memory sink switched off".to_string()));
        }

        let mut records = self
            .records
            .lock()
            .map_err(|_| FallbackError::Unavailable("lock poisoned".to_string()))?;
        records.push(FallbackRecord {
            entry: entry.clone(),
            reason: reason.to_string(),
        });
        Ok(())
    }
}

/// An audit entry that neither the durable store nor the fallback captured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditAlert {
    pub entity_name: String,
    pub entity_id: String,
    pub event_type: String,
    pub durable_error: String,
    pub fallback_error: String,
}

impl AuditAlert {
    pub fn new(entry: &AuditEntry, durable_error: &str, fallback_error: &FallbackError) -> Self {
        Self {
            entity_name: entry.entity_name().to_string(),
            entity_id: entry.entity_id().to_string(),
            event_type: entry.event_type().to_string(),
            durable_error: durable_error.to_string(),
            fallback_error: fallback_error.to_string(),
        }
    }
}

/// Raises alerts as error-level events under `countops::audit::alert`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAlertChannel;

impl AlertChannel for TracingAlertChannel {
    fn raise(&self, alert: &AuditAlert) {
        error!(
            target: "countops::audit::alert",
            audit_lost = true,
            entity_name = %alert.entity_name,
            entity_id = %alert.entity_id,
            event_type = %alert.event_type,
            durable_error = %alert.durable_error,
            fallback_error = %alert.fallback_error,
            "audit entry lost: durable store and fallback both failed"
        );
    }
}

/// Collects alerts in memory (tests/dev).
#[derive(Debug, Default)]
pub struct MemoryAlertChannel {
    alerts: Mutex<Vec<AuditAlert>>,
}

impl MemoryAlertChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> Vec<AuditAlert> {
        self.alerts
            .lock()
            .map(|alerts| alerts.clone())
            .unwrap_or_default()
    }
}

impl AlertChannel for MemoryAlertChannel {
    fn raise(&self, alert: &AuditAlert) {
        match self.alerts.lock() {
            Ok(mut alerts) => alerts.push(alert.clone()),
            Err(poisoned) => poisoned.into_inner().push(alert.clone()),
        }
    }
}

impl<T> FallbackSink for std::sync::Arc<T>
where
    T: FallbackSink + ?Sized,
{
    fn record(&self, entry: &AuditEntry, reason: &str) -> Result<(), FallbackError> {
        (**self).record(entry, reason)
    }
}

impl<T> AlertChannel for std::sync::Arc<T>
where
    T: AlertChannel + ?Sized,
{
    fn raise(&self, alert: &AuditAlert) {
        (**self).raise(alert)
    }
}
