//! Count-run lifecycle orchestration.
//!
//! ```text
//! start: acquire ──┬─ Acquired  ─→ audit "count_run.started" ─→ Started
//!                  ├─ Reentered ─→ AlreadyRunning (no audit, nothing changed)
//!                  └─ Busy      ─→ Busy { holder }
//!
//! stop:  release ──┬─ removed   ─→ audit "count_run.stopped" ─→ Stopped
//!                  └─ no-op     ─→ NotHeld
//! ```
//!
//! The registry decides; the audit trail records. Audit degradation is
//! reported inside the outcome but never turns a start or stop into a failure.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use countops_core::{LocationId, RunId};
use countops_inventory::{
    ActiveRunRegistration, CountRunEvent, CountRunStarted, CountRunStopped, CountType,
};

use crate::audit::{
    AlertChannel, AuditLogger, AuditOutcome, AuditStore, FallbackSink, TracingAlertChannel,
    TracingFallbackSink,
};
use crate::registry::{AcquireOutcome, RunRegistry};

/// Command: StartCountRun.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartCountRun {
    pub location_id: LocationId,
    pub run_id: RunId,
    pub operator: String,
    pub count_type: CountType,
    pub occurred_at: DateTime<Utc>,
}

/// Command: StopCountRun.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopCountRun {
    pub location_id: LocationId,
    pub run_id: RunId,
    pub operator: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// The run now holds the location.
    Started { audit: AuditOutcome },
    /// Retry of a start that already succeeded.
    AlreadyRunning,
    /// Another run is counting the location.
    Busy { holder: ActiveRunRegistration },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped { audit: AuditOutcome },
    /// The run did not hold the location (already stopped, or never started).
    NotHeld,
}

#[derive(Debug)]
pub struct CountRunCoordinator<S, F = TracingFallbackSink, A = TracingAlertChannel> {
    registry: Arc<RunRegistry>,
    audit: AuditLogger<S, F, A>,
}

impl<S, F, A> CountRunCoordinator<S, F, A>
where
    S: AuditStore,
    F: FallbackSink,
    A: AlertChannel,
{
    pub fn new(registry: Arc<RunRegistry>, audit: AuditLogger<S, F, A>) -> Self {
        Self { registry, audit }
    }

    pub fn registry(&self) -> &Arc<RunRegistry> {
        &self.registry
    }

    pub fn audit(&self) -> &AuditLogger<S, F, A> {
        &self.audit
    }

    pub async fn start_run(&self, cmd: StartCountRun) -> StartOutcome {
        let registration = ActiveRunRegistration::new(cmd.run_id, cmd.occurred_at)
            .with_operator(cmd.operator.clone())
            .with_count_type(cmd.count_type);

        match self.registry.acquire(cmd.location_id, registration) {
            AcquireOutcome::Acquired => {
                info!(
                    location_id = %cmd.location_id,
                    run_id = %cmd.run_id,
                    operator = %cmd.operator,
                    count_type = %cmd.count_type,
                    "count run started"
                );
                let event = CountRunEvent::Started(CountRunStarted {
                    location_id: cmd.location_id,
                    run_id: cmd.run_id,
                    count_type: cmd.count_type,
                    operator: cmd.operator,
                    occurred_at: cmd.occurred_at,
                });
                let audit = self.audit.log_event(&event).await;
                StartOutcome::Started { audit }
            }
            AcquireOutcome::Reentered => StartOutcome::AlreadyRunning,
            AcquireOutcome::Busy { holder } => {
                warn!(
                    location_id = %cmd.location_id,
                    run_id = %cmd.run_id,
                    holder_run_id = %holder.run_id,
                    busy_by = holder.busy_by.as_deref().unwrap_or("unknown"),
                    "location already being counted"
                );
                StartOutcome::Busy { holder }
            }
        }
    }

    pub async fn stop_run(&self, cmd: StopCountRun) -> StopOutcome {
        if !self.registry.release(cmd.location_id, cmd.run_id) {
            return StopOutcome::NotHeld;
        }

        info!(
            location_id = %cmd.location_id,
            run_id = %cmd.run_id,
            operator = %cmd.operator,
            "count run stopped"
        );
        let event = CountRunEvent::Stopped(CountRunStopped {
            location_id: cmd.location_id,
            run_id: cmd.run_id,
            operator: cmd.operator,
            occurred_at: cmd.occurred_at,
        });
        let audit = self.audit.log_event(&event).await;
        StopOutcome::Stopped { audit }
    }
}
