//! Location summary read model (registry + run history + location metadata).

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use countops_core::LocationId;
use countops_inventory::LocationSummary;

use crate::directory::{DirectoryError, LocationDirectory};
use crate::history::{HistoryError, RunHistoryStore};
use crate::registry::RunRegistry;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SummaryError {
    #[error("unknown location: {0}")]
    UnknownLocation(LocationId),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

/// Builds [`LocationSummary`] views for status endpoints.
///
/// Summaries are recomputed on every call and never stored. The registry is
/// only peeked at, never acquired.
#[derive(Debug)]
pub struct LocationSummaryService<H, D> {
    registry: Arc<RunRegistry>,
    history: H,
    directory: D,
}

impl<H, D> LocationSummaryService<H, D>
where
    H: RunHistoryStore,
    D: LocationDirectory,
{
    pub fn new(registry: Arc<RunRegistry>, history: H, directory: D) -> Self {
        Self {
            registry,
            history,
            directory,
        }
    }

    /// Current status of one location.
    ///
    /// History can lag behind the registry. A run that holds the location
    /// but is not in history yet shows up as `active_run_id` with no matching
    /// status item; that is not an error.
    pub async fn summarize(&self, location_id: LocationId) -> Result<LocationSummary, SummaryError> {
        let location_name = self
            .directory
            .location_name(location_id)
            .await?
            .ok_or(SummaryError::UnknownLocation(location_id))?;

        let active = self.registry.peek(location_id);
        let statuses = self.history.list_runs_for_location(location_id).await?;

        if let Some(active) = &active {
            if !statuses.iter().any(|s| s.run_id == Some(active.run_id)) {
                debug!(%location_id, run_id = %active.run_id, "active run not yet in history");
            }
        }

        Ok(LocationSummary::compose(
            location_id,
            location_name,
            active.as_ref(),
            statuses,
        ))
    }

    /// One summary per id, in input order. Stops at the first error.
    pub async fn summarize_many(
        &self,
        location_ids: &[LocationId],
    ) -> Result<Vec<LocationSummary>, SummaryError> {
        let mut summaries = Vec::with_capacity(location_ids.len());
        for location_id in location_ids {
            summaries.push(self.summarize(*location_id).await?);
        }
        Ok(summaries)
    }
}
