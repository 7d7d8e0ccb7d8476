use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use super::entry::AuditEntry;

/// Failure of the durable audit write.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuditStoreError {
    #[error("audit storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("audit write timed out after {0:?}")]
    Timeout(Duration),
}

/// Durable, append-only audit storage (e.g. an `audit_log` table).
///
/// Implementations never update or delete entries.
#[async_trait::async_trait]
pub trait AuditStore: Send + Sync {
    async fn append(&self, entry: &AuditEntry) -> Result<(), AuditStoreError>;
}

#[async_trait::async_trait]
impl<S> AuditStore for Arc<S>
where
    S: AuditStore + ?Sized,
{
    async fn append(&self, entry: &AuditEntry) -> Result<(), AuditStoreError> {
        (**self).append(entry).await
    }
}
