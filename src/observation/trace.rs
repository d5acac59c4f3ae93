//! Trace builder: the root of an observation tree.

use super::attributes::{ScoreAttributes, TraceAttributes, TraceUpdate};
use super::parent::ObservationParent;
use super::{enqueue_state, overwrite};
use crate::client::Client;
use crate::ingestion::EventKind;
use crate::utils::{current_timestamp, generate_id, merge_into, to_body};
use serde::Serialize;
use serde_json::{Map, Value};

/// One logical user or task interaction.
///
/// Constructing a `Trace` (through [`Client::trace`]) enqueues its `trace-create` event.
/// Updates issued before the next flush are coalesced into that event by the queue.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trace {
    #[serde(skip)]
    client: Client,
    id: String,
    name: Option<String>,
    user_id: Option<String>,
    session_id: Option<String>,
    version: Option<String>,
    release: Option<String>,
    input: Option<Value>,
    output: Option<Value>,
    metadata: Map<String, Value>,
    tags: Vec<String>,
    timestamp: Option<String>,
    #[serde(skip)]
    extra: Map<String, Value>,
}

impl Trace {
    pub(crate) fn create(client: Client, attrs: TraceAttributes) -> Self {
        let trace = Self {
            client,
            id: attrs.id.unwrap_or_else(generate_id),
            name: attrs.name,
            user_id: attrs.user_id,
            session_id: attrs.session_id,
            version: attrs.version,
            release: attrs.release,
            input: attrs.input,
            output: attrs.output,
            metadata: attrs.metadata,
            tags: attrs.tags,
            timestamp: Some(attrs.timestamp.unwrap_or_else(current_timestamp)),
            extra: attrs.extra,
        };
        enqueue_state(&trace.client, EventKind::TraceCreate, &trace, &trace.extra, &[]);
        trace
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn input(&self) -> Option<&Value> {
        self.input.as_ref()
    }

    pub fn output(&self) -> Option<&Value> {
        self.output.as_ref()
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn timestamp(&self) -> Option<&str> {
        self.timestamp.as_deref()
    }

    /// Apply a partial update and enqueue a `trace-update` with the cumulative state.
    ///
    /// The update body never carries `timestamp`, so coalescing keeps the original one.
    pub fn update(&mut self, update: TraceUpdate) -> &mut Self {
        overwrite(&mut self.name, update.name);
        overwrite(&mut self.user_id, update.user_id);
        overwrite(&mut self.session_id, update.session_id);
        overwrite(&mut self.version, update.version);
        overwrite(&mut self.release, update.release);
        overwrite(&mut self.input, update.input);
        overwrite(&mut self.output, update.output);
        merge_into(&mut self.metadata, update.metadata);
        self.tags.extend(update.tags);
        merge_into(&mut self.extra, update.extra);

        enqueue_state(&self.client, EventKind::TraceUpdate, &*self, &self.extra, &["timestamp"]);
        self
    }

    /// Attach a score to this trace.
    pub fn score(&self, attrs: ScoreAttributes) {
        self.client.score(attrs.trace_id(self.id.clone()));
    }

    /// Link to this trace in the Langfuse UI.
    pub fn url(&self) -> String {
        format!("{}/trace/{}", self.client.host(), self.id)
    }

    /// Current state as a wire body.
    pub fn to_body(&self) -> Map<String, Value> {
        to_body(self, &self.extra).unwrap_or_default()
    }
}

impl ObservationParent for Trace {
    fn client(&self) -> &Client {
        &self.client
    }

    fn trace_id(&self) -> &str {
        &self.id
    }

    fn observation_id(&self) -> Option<&str> {
        None
    }
}
