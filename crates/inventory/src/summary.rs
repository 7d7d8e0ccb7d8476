use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use countops_core::{LocationId, RunId};

use crate::count_run::{ActiveRunRegistration, CountType};

/// One historical or in-progress run of a location, as recorded by run history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountStatusItem {
    pub run_id: Option<RunId>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl CountStatusItem {
    pub fn started(run_id: RunId, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id: Some(run_id),
            started_at: Some(started_at),
            completed_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// Per-location status view, recomputed on each query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationSummary {
    pub location_id: LocationId,
    pub location_name: String,
    pub busy_by: Option<String>,
    pub active_run_id: Option<RunId>,
    pub active_count_type: Option<CountType>,
    pub active_started_at: Option<DateTime<Utc>>,
    pub count_statuses: Vec<CountStatusItem>,
}

impl LocationSummary {
    /// Combine the current registration (if any) with run history.
    ///
    /// History may lag behind the registry: an active run without a matching
    /// status item is reported as active and nothing else.
    pub fn compose(
        location_id: LocationId,
        location_name: String,
        active: Option<&ActiveRunRegistration>,
        mut count_statuses: Vec<CountStatusItem>,
    ) -> Self {
        // Most recent first; items without a start time go last.
        count_statuses.sort_by(|a, b| b.started_at.cmp(&a.started_at));

        Self {
            location_id,
            location_name,
            busy_by: active.and_then(|a| a.busy_by.clone()),
            active_run_id: active.map(|a| a.run_id),
            active_count_type: active.and_then(|a| a.count_type),
            active_started_at: active.map(|a| a.started_at),
            count_statuses,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.active_run_id.is_some()
    }

    /// History entry for the active run, once history has caught up.
    pub fn active_status(&self) -> Option<&CountStatusItem> {
        let run_id = self.active_run_id?;
        self.count_statuses
            .iter()
            .find(|s| s.run_id == Some(run_id))
    }
}
