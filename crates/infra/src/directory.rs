//! Location metadata boundary.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use thiserror::Error;

use countops_core::LocationId;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("location directory unavailable: {0}")]
    Unavailable(String),
}

/// Source of human-readable location names.
#[async_trait::async_trait]
pub trait LocationDirectory: Send + Sync {
    /// Name of a location, or `None` if the location is unknown.
    async fn location_name(&self, location_id: LocationId) -> Result<Option<String>, DirectoryError>;
}

#[async_trait::async_trait]
impl<D> LocationDirectory for Arc<D>
where
    D: LocationDirectory + ?Sized,
{
    async fn location_name(&self, location_id: LocationId) -> Result<Option<String>, DirectoryError> {
        (**self).location_name(location_id).await
    }
}

/// In-memory location directory for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryLocationDirectory {
    names: RwLock<HashMap<LocationId, String>>,
}

impl InMemoryLocationDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &self,
        location_id: LocationId,
        name: impl Into<String>,
    ) -> Result<(), DirectoryError> {
        let mut names = self
            .names
            .write()
            .map_err(|_| DirectoryError::Unavailable("lock poisoned".to_string()))?;
        names.insert(location_id, name.into());
        Ok(())
    }
}

#[async_trait::async_trait]
impl LocationDirectory for InMemoryLocationDirectory {
    async fn location_name(&self, location_id: LocationId) -> Result<Option<String>, DirectoryError> {
        let names = self
            .names
            .read()
            .map_err(|_| DirectoryError::Unavailable("lock poisoned".to_string()))?;
        Ok(names.get(&location_id).cloned())
    }
}
