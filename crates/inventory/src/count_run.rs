use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use countops_core::{LocationId, RunId};
use countops_events::Event;

/// Kind of counting run an operator starts on a location.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountType {
    /// Every item on the location is counted.
    Full,
    /// A subset of references is counted.
    Partial,
    /// Quick verification of a few positions.
    Spot,
}

impl CountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CountType::Full => "full",
            CountType::Partial => "partial",
            CountType::Spot => "spot",
        }
    }
}

impl core::fmt::Display for CountType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// "This run currently holds exclusive counting rights on a location."
///
/// Two registrations denote the same holder iff their `run_id`s are equal; the
/// remaining fields are descriptive and are not compared by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveRunRegistration {
    pub run_id: RunId,
    /// Display name of the operator counting the location.
    pub busy_by: Option<String>,
    pub count_type: Option<CountType>,
    pub started_at: DateTime<Utc>,
}

impl ActiveRunRegistration {
    pub fn new(run_id: RunId, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id,
            busy_by: None,
            count_type: None,
            started_at,
        }
    }

    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        self.busy_by = Some(operator.into());
        self
    }

    pub fn with_count_type(mut self, count_type: CountType) -> Self {
        self.count_type = Some(count_type);
        self
    }

    pub fn is_held_by(&self, run_id: RunId) -> bool {
        self.run_id == run_id
    }
}

/// Event: CountRunStarted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRunStarted {
    pub location_id: LocationId,
    pub run_id: RunId,
    pub count_type: CountType,
    pub operator: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CountRunStopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRunStopped {
    pub location_id: LocationId,
    pub run_id: RunId,
    pub operator: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CountRunEvent {
    Started(CountRunStarted),
    Stopped(CountRunStopped),
}

impl CountRunEvent {
    pub fn run_id(&self) -> RunId {
        match self {
            CountRunEvent::Started(e) => e.run_id,
            CountRunEvent::Stopped(e) => e.run_id,
        }
    }
}

impl Event for CountRunEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CountRunEvent::Started(_) => "count_run.started",
            CountRunEvent::Stopped(_) => "count_run.stopped",
        }
    }

    fn entity_name(&self) -> &'static str {
        "CountRun"
    }

    fn entity_id(&self) -> String {
        self.run_id().to_string()
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            CountRunEvent::Started(e) => e.occurred_at,
            CountRunEvent::Stopped(e) => e.occurred_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_identity_is_run_id() {
        let run_id = RunId::new();
        let a = ActiveRunRegistration::new(run_id, Utc::now()).with_operator("alice");
        let b = ActiveRunRegistration::new(run_id, Utc::now()).with_count_type(CountType::Spot);
        assert!(a.is_held_by(b.run_id));
        assert!(!a.is_held_by(RunId::new()));
    }

    #[test]
    fn event_metadata() {
        let run_id = RunId::new();
        let ev = CountRunEvent::Started(CountRunStarted {
            location_id: LocationId::new(),
            run_id,
            count_type: CountType::Full,
            operator: "alice".to_string(),
            occurred_at: Utc::now(),
        });
        assert_eq!(ev.event_type(), "count_run.started");
        assert_eq!(ev.entity_name(), "CountRun");
        assert_eq!(ev.entity_id(), run_id.to_string());
    }

    #[test]
    fn count_type_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&CountType::Partial).unwrap(), "\"partial\"");
        assert_eq!(CountType::Spot.to_string(), "spot");
    }
}
