//! Domain events.
//!
//! Every state-changing operation in the counting domain produces an event;
//! the audit logger turns events into append-only audit entries.

pub mod event;

pub use event::Event;
