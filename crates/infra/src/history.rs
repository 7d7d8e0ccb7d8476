//! Run-history store boundary (historical count runs per location).

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use thiserror::Error;

use countops_core::{LocationId, RunId};
use countops_inventory::CountStatusItem;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HistoryError {
    #[error("run history unavailable: {0}")]
    Unavailable(String),
}

/// Read access to recorded count runs.
#[async_trait::async_trait]
pub trait RunHistoryStore: Send + Sync {
    /// All known runs of a location, in no particular order.
    async fn list_runs_for_location(
        &self,
        location_id: LocationId,
    ) -> Result<Vec<CountStatusItem>, HistoryError>;
}

#[async_trait::async_trait]
impl<S> RunHistoryStore for Arc<S>
where
    S: RunHistoryStore + ?Sized,
{
    async fn list_runs_for_location(
        &self,
        location_id: LocationId,
    ) -> Result<Vec<CountStatusItem>, HistoryError> {
        (**self).list_runs_for_location(location_id).await
    }
}

/// In-memory run history for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryRunHistory {
    runs: RwLock<HashMap<LocationId, Vec<CountStatusItem>>>,
}

impl InMemoryRunHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_started(
        &self,
        location_id: LocationId,
        run_id: RunId,
        started_at: DateTime<Utc>,
    ) -> Result<(), HistoryError> {
        let mut runs = self.write()?;
        runs.entry(location_id)
            .or_default()
            .push(CountStatusItem::started(run_id, started_at));
        Ok(())
    }

    /// Mark a run as completed. Returns `false` if the run was never recorded.
    pub fn record_completed(
        &self,
        location_id: LocationId,
        run_id: RunId,
        completed_at: DateTime<Utc>,
    ) -> Result<bool, HistoryError> {
        let mut runs = self.write()?;
        let item = runs
            .get_mut(&location_id)
            .and_then(|items| items.iter_mut().find(|i| i.run_id == Some(run_id)));

        match item {
            Some(item) => {
                item.completed_at = Some(completed_at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<LocationId, Vec<CountStatusItem>>>, HistoryError>
    {
        self.runs
            .write()
            .map_err(|_| HistoryError::Unavailable("lock poisoned".to_string()))
    }
}

#[async_trait::async_trait]
impl RunHistoryStore for InMemoryRunHistory {
    async fn list_runs_for_location(
        &self,
        location_id: LocationId,
    ) -> Result<Vec<CountStatusItem>, HistoryError> {
        let runs = self
            .runs
            .read()
            .map_err(|_| HistoryError::Unavailable("lock poisoned".to_string()))?;
        Ok(runs.get(&location_id).cloned().unwrap_or_default())
    }
}
