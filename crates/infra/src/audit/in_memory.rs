use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use super::entry::AuditEntry;
use super::r#trait::{AuditStore, AuditStoreError};

/// In-memory append-only audit store.
///
/// Intended for tests/dev. [`set_available`](Self::set_available) simulates a
/// storage outage.
#[derive(Debug)]
pub struct InMemoryAuditStore {
    entries: RwLock<Vec<AuditEntry>>,
    available: AtomicBool,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            available: AtomicBool::new(true),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Everything appended so far, in append order.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .read()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

impl Default for InMemoryAuditStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl AuditStore for InMemoryAuditStore {
    async fn append(&self, entry: &AuditEntry) -> Result<(), AuditStoreError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(AuditStoreError::StorageUnavailable(
                "in-memory store switched off".to_string(),
            ));
        }

        let mut entries = self
            .entries
            .write()
            .map_err(|_| AuditStoreError::StorageUnavailable("lock poisoned".to_string()))?;
        entries.push(entry.clone());
        Ok(())
    }
}
