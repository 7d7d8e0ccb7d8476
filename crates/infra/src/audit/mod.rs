//! Append-only audit trail with a degraded-but-safe fallback.
//!
//! Every state-changing count-run operation emits an [`AuditEntry`]. The
//! [`AuditLogger`] writes it to the durable [`AuditStore`] first; if that
//! fails, the entry goes to a synchronous [`FallbackSink`] instead, and if
//! *that* fails too, an alert is raised on the [`AlertChannel`].
//!
//! Whatever happens, the caller's operation proceeds: the logger reports what
//! happened through [`AuditOutcome`] and never returns an error.

pub mod entry;
pub mod fallback;
pub mod in_memory;
pub mod logger;
pub mod r#trait;

pub use entry::AuditEntry;
pub use fallback::{
    AlertChannel, AuditAlert, FallbackError, FallbackRecord, FallbackSink, MemoryAlertChannel,
    MemoryFallbackSink, TracingAlertChannel, TracingFallbackSink,
};
pub use in_memory::InMemoryAuditStore;
pub use logger::{AuditLogger, AuditOutcome, AuditStats};
pub use r#trait::{AuditStore, AuditStoreError};
