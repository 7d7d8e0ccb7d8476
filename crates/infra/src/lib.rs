//! Infrastructure layer: run registry, audit trail, stores, read models, config.

pub mod audit;
pub mod config;
pub mod coordinator;
pub mod directory;
pub mod history;
pub mod registry;
pub mod summary;


pub use audit::{AuditEntry, AuditLogger, AuditOutcome, AuditStats, AuditStore, AuditStoreError};
pub use config::{ConfigError, CoordinatorConfig};
pub use coordinator::{CountRunCoordinator, StartCountRun, StartOutcome, StopCountRun, StopOutcome};
pub use directory::{InMemoryLocationDirectory, LocationDirectory};
pub use history::{InMemoryRunHistory, RunHistoryStore};
pub use registry::{AcquireOutcome, RunRegistry};
pub use summary::{LocationSummaryService, SummaryError};
