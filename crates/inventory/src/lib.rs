//! Inventory counting domain module.
//!
//! This crate contains the business rules for counting, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage):
//!
//! - inventory code normalization/validation and digit projection
//! - count-run registrations and lifecycle events
//! - the per-location summary read model

pub mod code;
pub mod count_run;
pub mod digits;
pub mod summary;

pub use code::{
    ALLOWED_SYMBOLS, CodeError, InventoryCode, MAX_CODE_LENGTH, normalize, try_validate,
};
pub use count_run::{
    ActiveRunRegistration, CountRunEvent, CountRunStarted, CountRunStopped, CountType,
};
pub use digits::project_digits;
pub use summary::{CountStatusItem, LocationSummary};
