//! Event builder: an instantaneous record within a trace.

use super::attributes::EventAttributes;
use super::enqueue_state;
use super::types::{ObservationLevel, ObservationType};
use crate::client::Client;
use crate::error::Result;
use crate::ingestion::EventKind;
use crate::utils::{current_timestamp, generate_id, to_body};
use serde::Serialize;
use serde_json::{Map, Value};

/// A point-in-time observation. Events are written once and never updated.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(skip)]
    client: Client,
    id: String,
    trace_id: String,
    name: String,
    start_time: String,
    input: Option<Value>,
    output: Option<Value>,
    metadata: Map<String, Value>,
    level: Option<ObservationLevel>,
    status_message: Option<String>,
    parent_observation_id: Option<String>,
    version: Option<String>,
    #[serde(rename = "type")]
    as_type: Option<ObservationType>,
    #[serde(skip)]
    extra: Map<String, Value>,
}

impl Event {
    pub(crate) fn create(client: Client, trace_id: String, attrs: EventAttributes) -> Result<Self> {
        let as_type = ObservationType::parse_optional(attrs.as_type.as_deref())?;

        let event = Self {
            client,
            id: attrs.id.unwrap_or_else(generate_id),
            trace_id,
            name: attrs.name,
            start_time: attrs.start_time.unwrap_or_else(current_timestamp),
            input: attrs.input,
            output: attrs.output,
            metadata: attrs.metadata,
            level: attrs.level,
            status_message: attrs.status_message,
            parent_observation_id: attrs.parent_observation_id,
            version: attrs.version,
            as_type,
            extra: attrs.extra,
        };
        enqueue_state(&event.client, EventKind::EventCreate, &event, &event.extra, &[]);
        Ok(event)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_time(&self) -> &str {
        &self.start_time
    }

    pub fn to_body(&self) -> Map<String, Value> {
        to_body(self, &self.extra).unwrap_or_default()
    }
}
