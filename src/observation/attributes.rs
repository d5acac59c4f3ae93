//! Caller-facing attribute and update structs for the observation builders.
//!
//! Every struct carries an `extra` open map. Its entries are merged over the typed
//! fields when the body is serialized, so fields this crate does not model can still be
//! sent.

use super::types::{ObservationLevel, ObservationType};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Interpret a JSON value as a mapping: objects pass through, `null` becomes empty, and any
/// other value is wrapped as `{"value": ...}`.
pub fn to_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            map
        }
    }
}

/// Attributes for a new [`Trace`](super::Trace).
#[derive(Debug, Clone, Default)]
pub struct TraceAttributes {
    pub id: Option<String>,
    pub name: Option<String>,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub version: Option<String>,
    pub release: Option<String>,
    pub input: Option<Value>,
    pub output: Option<Value>,
    pub metadata: Map<String, Value>,
    pub tags: Vec<String>,
    /// Defaults to the construction time.
    pub timestamp: Option<String>,
    pub extra: Map<String, Value>,
}

impl TraceAttributes {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn release(mut self, release: impl Into<String>) -> Self {
        self.release = Some(release.into());
        self
    }

    pub fn input(mut self, input: Value) -> Self {
        self.input = Some(input);
        self
    }

    pub fn output(mut self, output: Value) -> Self {
        self.output = Some(output);
        self
    }

    pub fn metadata(mut self, metadata: Value) -> Self {
        self.metadata = to_map(metadata);
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Attributes for a new [`Span`](super::Span) or one of the span-based enhanced types.
#[derive(Debug, Clone, Default)]
pub struct SpanAttributes {
    pub id: Option<String>,
    pub name: Option<String>,
    /// Defaults to the construction time.
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub input: Option<Value>,
    pub output: Option<Value>,
    pub metadata: Map<String, Value>,
    pub level: Option<ObservationLevel>,
    pub status_message: Option<String>,
    pub version: Option<String>,
    /// Only honoured when the parent is a trace; nested children always point at their
    /// parent observation.
    pub parent_observation_id: Option<String>,
    /// Checked against [`ObservationType`] at construction.
    pub as_type: Option<String>,
    pub extra: Map<String, Value>,
}

impl SpanAttributes {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn start_time(mut self, start_time: impl Into<String>) -> Self {
        self.start_time = Some(start_time.into());
        self
    }

    pub fn end_time(mut self, end_time: impl Into<String>) -> Self {
        self.end_time = Some(end_time.into());
        self
    }

    pub fn input(mut self, input: Value) -> Self {
        self.input = Some(input);
        self
    }

    pub fn output(mut self, output: Value) -> Self {
        self.output = Some(output);
        self
    }

    pub fn metadata(mut self, metadata: Value) -> Self {
        self.metadata = to_map(metadata);
        self
    }

    pub fn level(mut self, level: ObservationLevel) -> Self {
        self.level = Some(level);
        self
    }

    pub fn status_message(mut self, message: impl Into<String>) -> Self {
        self.status_message = Some(message.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn parent_observation_id(mut self, id: impl Into<String>) -> Self {
        self.parent_observation_id = Some(id.into());
        self
    }

    pub fn as_type(mut self, as_type: impl Into<String>) -> Self {
        self.as_type = Some(as_type.into());
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Attributes for an `embedding` observation.
///
/// `model` and `usage` are folded into the span's metadata.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingAttributes {
    pub span: SpanAttributes,
    pub model: Option<String>,
    pub usage: Option<Value>,
}

impl EmbeddingAttributes {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            span: SpanAttributes::new(name),
            ..Default::default()
        }
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn usage(mut self, usage: Value) -> Self {
        self.usage = Some(usage);
        self
    }

    pub fn input(mut self, input: Value) -> Self {
        self.span.input = Some(input);
        self
    }

    pub fn output(mut self, output: Value) -> Self {
        self.span.output = Some(output);
        self
    }

    /// Span attributes with `as_type = embedding` and the model details merged into
    /// metadata.
    pub fn into_span_attributes(self) -> SpanAttributes {
        let mut span = self.span;
        if let Some(model) = self.model {
            span.metadata.insert("model".to_string(), Value::String(model));
        }
        if let Some(usage) = self.usage.filter(|u| !u.is_null()) {
            span.metadata.insert("usage".to_string(), usage);
        }
        span.as_type = Some(ObservationType::Embedding.as_str().to_string());
        span
    }
}

/// Attributes for a new [`Generation`](super::Generation).
#[derive(Debug, Clone, Default)]
pub struct GenerationAttributes {
    pub id: Option<String>,
    pub name: Option<String>,
    /// Left unset unless given, for generations whose start is recorded later.
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub completion_start_time: Option<String>,
    pub model: Option<String>,
    pub model_parameters: Map<String, Value>,
    pub input: Option<Value>,
    pub output: Option<Value>,
    pub usage: Map<String, Value>,
    pub metadata: Map<String, Value>,
    pub level: Option<ObservationLevel>,
    pub status_message: Option<String>,
    pub version: Option<String>,
    pub parent_observation_id: Option<String>,
    pub as_type: Option<String>,
    pub extra: Map<String, Value>,
}

impl GenerationAttributes {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn start_time(mut self, start_time: impl Into<String>) -> Self {
        self.start_time = Some(start_time.into());
        self
    }

    pub fn completion_start_time(mut self, time: impl Into<String>) -> Self {
        self.completion_start_time = Some(time.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn model_parameters(mut self, parameters: Value) -> Self {
        self.model_parameters = to_map(parameters);
        self
    }

    pub fn input(mut self, input: Value) -> Self {
        self.input = Some(input);
        self
    }

    pub fn output(mut self, output: Value) -> Self {
        self.output = Some(output);
        self
    }

    pub fn usage(mut self, usage: Value) -> Self {
        self.usage = to_map(usage);
        self
    }

    pub fn metadata(mut self, metadata: Value) -> Self {
        self.metadata = to_map(metadata);
        self
    }

    pub fn level(mut self, level: ObservationLevel) -> Self {
        self.level = Some(level);
        self
    }

    pub fn parent_observation_id(mut self, id: impl Into<String>) -> Self {
        self.parent_observation_id = Some(id.into());
        self
    }

    pub fn as_type(mut self, as_type: impl Into<String>) -> Self {
        self.as_type = Some(as_type.into());
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Attributes for a new [`Event`](super::Event). Events always have a name.
#[derive(Debug, Clone, Default)]
pub struct EventAttributes {
    pub id: Option<String>,
    pub name: String,
    /// Defaults to the construction time.
    pub start_time: Option<String>,
    pub input: Option<Value>,
    pub output: Option<Value>,
    pub metadata: Map<String, Value>,
    pub level: Option<ObservationLevel>,
    pub status_message: Option<String>,
    pub version: Option<String>,
    pub parent_observation_id: Option<String>,
    pub as_type: Option<String>,
    pub extra: Map<String, Value>,
}

impl EventAttributes {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn input(mut self, input: Value) -> Self {
        self.input = Some(input);
        self
    }

    pub fn output(mut self, output: Value) -> Self {
        self.output = Some(output);
        self
    }

    pub fn metadata(mut self, metadata: Value) -> Self {
        self.metadata = to_map(metadata);
        self
    }

    pub fn level(mut self, level: ObservationLevel) -> Self {
        self.level = Some(level);
        self
    }

    pub fn status_message(mut self, message: impl Into<String>) -> Self {
        self.status_message = Some(message.into());
        self
    }

    pub fn as_type(mut self, as_type: impl Into<String>) -> Self {
        self.as_type = Some(as_type.into());
        self
    }
}

/// Partial update for a trace. `None` and empty fields leave the current state alone.
#[derive(Debug, Clone, Default)]
pub struct TraceUpdate {
    pub name: Option<String>,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub version: Option<String>,
    pub release: Option<String>,
    pub input: Option<Value>,
    pub output: Option<Value>,
    /// Merged key by key.
    pub metadata: Map<String, Value>,
    /// Appended.
    pub tags: Vec<String>,
    pub extra: Map<String, Value>,
}

impl TraceUpdate {
    pub fn output(output: Value) -> Self {
        Self {
            output: Some(output),
            ..Default::default()
        }
    }
}

/// Partial update for a span.
#[derive(Debug, Clone, Default)]
pub struct SpanUpdate {
    pub name: Option<String>,
    pub end_time: Option<String>,
    pub input: Option<Value>,
    pub output: Option<Value>,
    pub metadata: Map<String, Value>,
    pub level: Option<ObservationLevel>,
    pub status_message: Option<String>,
    pub version: Option<String>,
    pub extra: Map<String, Value>,
}

/// Partial update for a generation.
#[derive(Debug, Clone, Default)]
pub struct GenerationUpdate {
    pub name: Option<String>,
    pub end_time: Option<String>,
    pub completion_start_time: Option<String>,
    pub model: Option<String>,
    pub model_parameters: Map<String, Value>,
    pub input: Option<Value>,
    pub output: Option<Value>,
    pub usage: Map<String, Value>,
    pub metadata: Map<String, Value>,
    pub level: Option<ObservationLevel>,
    pub status_message: Option<String>,
    pub version: Option<String>,
    pub extra: Map<String, Value>,
}

/// How a score value should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScoreDataType {
    Numeric,
    Categorical,
    Boolean,
}

/// A named evaluation attached to a trace or observation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreAttributes {
    pub id: Option<String>,
    pub name: String,
    /// Number or string.
    pub value: Value,
    pub trace_id: Option<String>,
    pub observation_id: Option<String>,
    pub data_type: Option<ScoreDataType>,
    pub comment: Option<String>,
    #[serde(skip)]
    pub extra: Map<String, Value>,
}

impl ScoreAttributes {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            id: None,
            name: name.into(),
            value: value.into(),
            trace_id: None,
            observation_id: None,
            data_type: None,
            comment: None,
            extra: Map::new(),
        }
    }

    pub fn trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    pub fn observation_id(mut self, observation_id: impl Into<String>) -> Self {
        self.observation_id = Some(observation_id.into());
        self
    }

    pub fn data_type(mut self, data_type: ScoreDataType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}
