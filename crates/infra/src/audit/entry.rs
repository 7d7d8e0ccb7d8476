use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use countops_events::Event;

/// An immutable audit record.
///
/// Built once by the operation that produced it; there are no setters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    entity_name: String,
    entity_id: String,
    event_type: String,
    payload: JsonValue,
    created_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        entity_name: impl Into<String>,
        entity_id: impl Into<String>,
        event_type: impl Into<String>,
        payload: JsonValue,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            entity_name: entity_name.into(),
            entity_id: entity_id.into(),
            event_type: event_type.into(),
            payload,
            created_at,
        }
    }

    /// Build an entry from a typed domain event.
    ///
    /// The event's business time becomes `created_at`. A payload that cannot
    /// be serialized is replaced by a marker object so the entry itself is
    /// still recorded.
    pub fn from_event<E>(event: &E) -> Self
    where
        E: Event + Serialize,
    {
        let payload = serde_json::to_value(event).unwrap_or_else(|e| {
            serde_json::json!({ "payload_serialization_error": e.to_string() })
        });

        Self::new(
            event.entity_name(),
            event.entity_id(),
            event.event_type(),
            payload,
            event.occurred_at(),
        )
    }

    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn payload(&self) -> &JsonValue {
        &self.payload
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
