//! Generation builder: a span specialized for a model inference call.

use super::attributes::{to_map, GenerationAttributes, GenerationUpdate, ScoreAttributes};
use super::parent::ObservationParent;
use super::types::{ObservationLevel, ObservationType};
use super::{enqueue_state, overwrite};
use crate::client::Client;
use crate::error::Result;
use crate::ingestion::EventKind;
use crate::utils::{current_timestamp, generate_id, merge_into, to_body};
use serde::Serialize;
use serde_json::{Map, Value};

/// A model call with model name, parameters and token usage.
///
/// Unlike spans, a generation's `startTime` is only sent when it was given explicitly.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Generation {
    #[serde(skip)]
    client: Client,
    id: String,
    trace_id: String,
    name: Option<String>,
    start_time: Option<String>,
    end_time: Option<String>,
    completion_start_time: Option<String>,
    model: Option<String>,
    model_parameters: Map<String, Value>,
    input: Option<Value>,
    output: Option<Value>,
    usage: Map<String, Value>,
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

impl Generation {
    pub(crate) fn create(client: Client, trace_id: String, attrs: GenerationAttributes) -> Result<Self> {
        let as_type = ObservationType::parse_optional(attrs.as_type.as_deref())?;

        let generation = Self {
            client,
            id: attrs.id.unwrap_or_else(generate_id),
            trace_id,
            name: attrs.name,
            start_time: attrs.start_time,
            end_time: attrs.end_time,
            completion_start_time: attrs.completion_start_time,
            model: attrs.model,
            model_parameters: attrs.model_parameters,
            input: attrs.input,
            output: attrs.output,
            usage: attrs.usage,
            metadata: attrs.metadata,
            level: attrs.level,
            status_message: attrs.status_message,
            parent_observation_id: attrs.parent_observation_id,
            version: attrs.version,
            as_type,
            extra: attrs.extra,
        };
        enqueue_state(
            &generation.client,
            EventKind::GenerationCreate,
            &generation,
            &generation.extra,
            &[],
        );
        Ok(generation)
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

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn start_time(&self) -> Option<&str> {
        self.start_time.as_deref()
    }

    pub fn end_time(&self) -> Option<&str> {
        self.end_time.as_deref()
    }

    pub fn usage(&self) -> &Map<String, Value> {
        &self.usage
    }

    pub fn output(&self) -> Option<&Value> {
        self.output.as_ref()
    }

    pub fn update(&mut self, update: GenerationUpdate) -> &mut Self {
        overwrite(&mut self.name, update.name);
        overwrite(&mut self.end_time, update.end_time);
        overwrite(&mut self.completion_start_time, update.completion_start_time);
        overwrite(&mut self.model, update.model);
        merge_into(&mut self.model_parameters, update.model_parameters);
        overwrite(&mut self.input, update.input);
        overwrite(&mut self.output, update.output);
        merge_into(&mut self.usage, update.usage);
        merge_into(&mut self.metadata, update.metadata);
        overwrite(&mut self.level, update.level);
        overwrite(&mut self.status_message, update.status_message);
        overwrite(&mut self.version, update.version);
        merge_into(&mut self.extra, update.extra);

        self.enqueue_update();
        self
    }

    /// Close the generation. `end_time` defaults to now; `usage` is merged key by key.
    pub fn end(
        &mut self,
        output: Option<Value>,
        end_time: Option<String>,
        usage: Option<Value>,
    ) -> &mut Self {
        self.end_time = Some(end_time.unwrap_or_else(current_timestamp));
        overwrite(&mut self.output, output);
        if let Some(usage) = usage {
            merge_into(&mut self.usage, to_map(usage));
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
        enqueue_state(&self.client, EventKind::GenerationUpdate, self, &self.extra, &[]);
    }
}

impl ObservationParent for Generation {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::memory_client;
    use crate::observation::{SpanAttributes, TraceAttributes};
    use serde_json::json;

    #[test]
    fn test_start_time_left_unset_unless_given() {
        let (client, _transport) = memory_client();
        let trace = client.trace(TraceAttributes::new("root"));

        let deferred = trace.generation(GenerationAttributes::new("llm")).unwrap();
        let timed = trace
            .generation(GenerationAttributes::new("llm").start_time("2025-01-01T00:00:00.000Z"))
            .unwrap();

        let events = client.queued_events();
        assert!(deferred.start_time().is_none());
        assert!(events[1].body.get("startTime").is_none());
        assert_eq!(timed.start_time(), Some("2025-01-01T00:00:00.000Z"));
        assert_eq!(events[2].body["startTime"], "2025-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_create_body() {
        let (client, _transport) = memory_client();
        let trace = client.trace(TraceAttributes::new("root"));

        trace
            .generation(
                GenerationAttributes::new("chat-completion")
                    .model("gpt-4o")
                    .model_parameters(json!({"temperature": 0.2}))
                    .input(json!([{"role": "user", "content": "hi"}]))
                    .usage(json!({"input": 3})),
            )
            .unwrap();

        let event = &client.queued_events()[1];
        assert_eq!(event.kind, EventKind::GenerationCreate);
        assert_eq!(event.body["model"], "gpt-4o");
        assert_eq!(event.body["modelParameters"]["temperature"], 0.2);
        assert_eq!(event.body["usage"]["input"], 3);
        assert_eq!(event.body["traceId"], trace.id());
    }

    #[test]
    fn test_invalid_as_type() {
        let (client, _transport) = memory_client();
        let trace = client.trace(TraceAttributes::new("root"));

        assert!(trace
            .generation(GenerationAttributes::new("llm").as_type("model"))
            .is_err());
        assert_eq!(client.queue_len(), 1);
    }

    #[test]
    fn test_end_merges_usage() {
        let (client, _transport) = memory_client();
        let trace = client.trace(TraceAttributes::new("root"));
        let mut generation = trace
            .generation(GenerationAttributes::new("llm").usage(json!({"input": 10})))
            .unwrap();

        generation.end(
            Some(json!("Hello!")),
            None,
            Some(json!({"output": 2, "total": 12})),
        );

        assert_eq!(generation.usage()["input"], 10);
        let last = client.queued_events().pop().unwrap();
        assert_eq!(last.kind, EventKind::GenerationUpdate);
        assert_eq!(last.body["usage"], json!({"input": 10, "output": 2, "total": 12}));
        assert_eq!(last.body["output"], "Hello!");
        assert!(last.body["endTime"].is_string());
    }

    #[test]
    fn test_update_overwrites_scalars_and_merges_parameters() {
        let (client, _transport) = memory_client();
        let trace = client.trace(TraceAttributes::new("root"));
        let mut generation = trace
            .generation(
                GenerationAttributes::new("llm")
                    .model("small")
                    .model_parameters(json!({"temperature": 0.1})),
            )
            .unwrap();

        generation.update(GenerationUpdate {
            model: Some("large".to_string()),
            model_parameters: to_map(json!({"max_tokens": 100})),
            completion_start_time: Some("2025-01-01T00:00:00.500Z".to_string()),
            ..Default::default()
        });

        let last = client.queued_events().pop().unwrap();
        assert_eq!(generation.model(), Some("large"));
        assert_eq!(
            last.body["modelParameters"],
            json!({"temperature": 0.1, "max_tokens": 100})
        );
        assert_eq!(last.body["completionStartTime"], "2025-01-01T00:00:00.500Z");
    }

    #[test]
    fn test_nested_span_under_generation() {
        let (client, _transport) = memory_client();
        let trace = client.trace(TraceAttributes::new("root"));
        let generation = trace.generation(GenerationAttributes::new("llm")).unwrap();

        let tool = generation
            .tool(SpanAttributes::new("function-call"))
            .unwrap();

        assert_eq!(tool.parent_observation_id(), Some(generation.id()));
        assert_eq!(tool.as_type(), Some(ObservationType::Tool));
        assert_eq!(
            generation.url(),
            format!("https://langfuse.test/trace/{}?observation={}", trace.id(), generation.id())
        );
    }
}
