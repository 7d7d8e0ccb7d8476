use chrono::{DateTime, Utc};

/// A domain-agnostic event.
///
/// Events are:
/// - **immutable** (treat them as facts)
/// - **attributable** (they name the entity they happened to)
/// - designed to be **append-only**
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name/type identifier (e.g. "count_run.started").
    fn event_type(&self) -> &'static str;

    /// Name of the entity kind the event belongs to (e.g. "CountRun").
    fn entity_name(&self) -> &'static str;

    /// Identifier of the entity instance, rendered as text.
    fn entity_id(&self) -> String;

    /// When the event occurred (business time).
    fn occurred_at(&self) -> DateTime<Utc>;
}
