//! Span builder: a bounded sub-operation within a trace.

use super::attributes::{ScoreAttributes, SpanAttributes, SpanUpdate};
use super::parent::ObservationParent;
use super::types::{ObservationLevel, ObservationType};
use super::{enqueue_state, overwrite};
use crate::client::Client;
use crate::error::Result;
use crate::ingestion::EventKind;
use crate::utils::{current_timestamp, generate_id, merge_into, to_body};
use serde::Serialize;
use serde_json::{Map, Value};

/// A timed operation. Also backs the enhanced observation types (agent, tool, ...), which
/// differ only in their `type` field.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    #[serde(skip)]
    client: Client,
    id: String,
    trace_id: String,
    name: Option<String>,
    start_time: Option<String>,
    end_time: Option<String>,
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

impl Span {
    /// Validate `as_type`, then build the span and enqueue `span-create`.
    ///
    /// An invalid `as_type` fails before anything is enqueued.
    pub(crate) fn create(client: Client, trace_id: String, attrs: SpanAttributes) -> Result<Self> {
        let as_type = ObservationType::parse_optional(attrs.as_type.as_deref())?;

        let span = Self {
            client,
            id: attrs.id.unwrap_or_else(generate_id),
            trace_id,
            name: attrs.name,
            start_time: Some(attrs.start_time.unwrap_or_else(current_timestamp)),
            end_time: attrs.end_time,
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
        enqueue_state(&span.client, EventKind::SpanCreate, &span, &span.extra, &[]);
        Ok(span)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn parent_observation_id(&self) -> Option<&str> {
        self.parent_observation_id.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn as_type(&self) -> Option<ObservationType> {
        self.as_type
    }

    pub fn start_time(&self) -> Option<&str> {
        self.start_time.as_deref()
    }

    pub fn end_time(&self) -> Option<&str> {
        self.end_time.as_deref()
    }

    pub fn output(&self) -> Option<&Value> {
        self.output.as_ref()
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    pub fn update(&mut self, update: SpanUpdate) -> &mut Self {
        overwrite(&mut self.name, update.name);
        overwrite(&mut self.end_time, update.end_time);
        overwrite(&mut self.input, update.input);
        overwrite(&mut self.output, update.output);
        merge_into(&mut self.metadata, update.metadata);
        overwrite(&mut self.level, update.level);
        overwrite(&mut self.status_message, update.status_message);
        overwrite(&mut self.version, update.version);
        merge_into(&mut self.extra, update.extra);

        self.enqueue_update();
        self
    }

    /// Close the span. `end_time` defaults to now; `usage` is recorded under
    /// `metadata.usage`, since spans have no usage field of their own.
    pub fn end(
        &mut self,
        output: Option<Value>,
        end_time: Option<String>,
        usage: Option<Value>,
    ) -> &mut Self {
        self.end_time = Some(end_time.unwrap_or_else(current_timestamp));
        overwrite(&mut self.output, output);
        if let Some(usage) = usage.filter(|u| !u.is_null()) {
            self.metadata.insert("usage".to_string(), usage);
        }

        self.enqueue_update();
        self
    }

    pub fn score(&self, attrs: ScoreAttributes) {
        self.client.score(
            attrs
                .trace_id(self.trace_id.clone())
                .observation_id(self.id.clone()),
        );
    }

    pub fn url(&self) -> String {
        format!("{}/trace/{}?observation={}", self.client.host(), self.trace_id, self.id)
    }

    pub fn to_body(&self) -> Map<String, Value> {
        to_body(self, &self.extra).unwrap_or_default()
    }

    fn enqueue_update(&self) {
        enqueue_state(&self.client, EventKind::SpanUpdate, self, &self.extra, &[]);
    }
}

impl ObservationParent for Span {
    fn client(&self) -> &Client {
        &self.client
    }

    fn trace_id(&self) -> &str {
        &self.trace_id
    }

    fn observation_id(&self) -> Option<&str> {
        Some(&self.id)
    }
}
