//! Process-wide tracing/logging setup.

/// Tracing configuration (filters, formats).
pub mod tracing;

pub use crate::tracing::{LogFormat, init, init_with};
