//! Outbound event records held by the [`EventQueue`](super::EventQueue).

use crate::utils::{current_timestamp, generate_id};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// The eight event kinds the ingestion endpoint accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "trace-create")]
    TraceCreate,
    #[serde(rename = "trace-update")]
    TraceUpdate,
    #[serde(rename = "generation-create")]
    GenerationCreate,
    #[serde(rename = "generation-update")]
    GenerationUpdate,
    #[serde(rename = "span-create")]
    SpanCreate,
    #[serde(rename = "span-update")]
    SpanUpdate,
    #[serde(rename = "event-create")]
    EventCreate,
    #[serde(rename = "score-create")]
    ScoreCreate,
}

impl EventKind {
    pub const ALL: [EventKind; 8] = [
        EventKind::TraceCreate,
        EventKind::TraceUpdate,
        EventKind::GenerationCreate,
        EventKind::GenerationUpdate,
        EventKind::SpanCreate,
        EventKind::SpanUpdate,
        EventKind::EventCreate,
        EventKind::ScoreCreate,
    ];

    /// Wire name, e.g. `"span-create"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::TraceCreate => "trace-create",
            EventKind::TraceUpdate => "trace-update",
            EventKind::GenerationCreate => "generation-create",
            EventKind::GenerationUpdate => "generation-update",
            EventKind::SpanCreate => "span-create",
            EventKind::SpanUpdate => "span-update",
            EventKind::EventCreate => "event-create",
            EventKind::ScoreCreate => "score-create",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unrecognized event type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEventKind(pub String);

impl fmt::Display for UnknownEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown event type '{}'", self.0)
    }
}

impl std::error::Error for UnknownEventKind {}

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownEventKind(s.to_string()))
    }
}

/// A pending outbound event.
///
/// `body` is normally a JSON object; anything else marks an event that was built
/// incorrectly and is discarded at delivery time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub timestamp: String,
    pub body: Value,
}

impl QueuedEvent {
    /// Build an event with a fresh id and the current timestamp.
    pub fn new(kind: EventKind, body: Map<String, Value>) -> Self {
        Self {
            id: generate_id(),
            kind,
            timestamp: current_timestamp(),
            body: Value::Object(body),
        }
    }

    /// The `id` of the entity this event creates or updates, if the body carries one.
    pub fn target_id(&self) -> Option<&str> {
        self.body.get("id").and_then(Value::as_str)
    }

    pub fn has_valid_body(&self) -> bool {
        self.body.is_object()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_all_kinds() {
        for kind in EventKind::ALL {
            assert_eq!(kind.as_str().parse::<EventKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_parse_unknown_kind() {
        let err = "trace-delete".parse::<EventKind>().unwrap_err();
        assert_eq!(err, UnknownEventKind("trace-delete".to_string()));
        assert!("".parse::<EventKind>().is_err());
    }

    #[test]
    fn test_queued_event_serializes_type_field() {
        let body = json!({"id": "t1", "name": "a"}).as_object().cloned().unwrap();
        let event = QueuedEvent::new(EventKind::TraceCreate, body);

        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["type"], "trace-create");
        assert_eq!(value["body"]["id"], "t1");
        assert_eq!(value["id"], json!(event.id));
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_target_id() {
        let body = json!({"id": "span-1"}).as_object().cloned().unwrap();
        let event = QueuedEvent::new(EventKind::SpanCreate, body);
        assert_eq!(event.target_id(), Some("span-1"));

        let event = QueuedEvent::new(EventKind::SpanCreate, Map::new());
        assert_eq!(event.target_id(), None);
    }
}
