//! Null-object handles for graceful degradation.
//!
//! A handle is either a live builder or `Null`. `Null` accepts every call and does
//! nothing, so application code keeps working when the client could not be built or a
//! child observation failed validation.

use super::attributes::{
    EmbeddingAttributes, EventAttributes, GenerationAttributes, GenerationUpdate, ScoreAttributes,
    SpanAttributes, SpanUpdate, TraceUpdate,
};
use super::event::Event;
use super::generation::Generation;
use super::parent::ObservationParent;
use super::span::Span;
use super::trace::Trace;
use crate::error::Result;
use serde_json::{Map, Value};
use tracing::warn;

fn degrade<T>(kind: &str, result: Option<Result<T>>) -> Option<T> {
    match result? {
        Ok(observation) => Some(observation),
        Err(e) => {
            warn!(observation = kind, error = %e, "Failed to create observation, using no-op handle");
            None
        }
    }
}

/// Child constructors on handles. A `Null` parent always yields `Null` children.
pub trait HandleParent {
    fn parent(&self) -> Option<&dyn ObservationParent>;

    fn span(&self, attrs: SpanAttributes) -> SpanHandle {
        degrade("span", self.parent().map(|p| p.span(attrs))).into()
    }

    fn generation(&self, attrs: GenerationAttributes) -> GenerationHandle {
        degrade("generation", self.parent().map(|p| p.generation(attrs))).into()
    }

    fn event(&self, attrs: EventAttributes) -> EventHandle {
        degrade("event", self.parent().map(|p| p.event(attrs))).into()
    }

    fn agent(&self, attrs: SpanAttributes) -> SpanHandle {
        degrade("agent", self.parent().map(|p| p.agent(attrs))).into()
    }

    fn tool(&self, attrs: SpanAttributes) -> SpanHandle {
        degrade("tool", self.parent().map(|p| p.tool(attrs))).into()
    }

    fn chain(&self, attrs: SpanAttributes) -> SpanHandle {
        degrade("chain", self.parent().map(|p| p.chain(attrs))).into()
    }

    fn retriever(&self, attrs: SpanAttributes) -> SpanHandle {
        degrade("retriever", self.parent().map(|p| p.retriever(attrs))).into()
    }

    fn embedding(&self, attrs: EmbeddingAttributes) -> SpanHandle {
        degrade("embedding", self.parent().map(|p| p.embedding(attrs))).into()
    }

    fn evaluator(&self, attrs: SpanAttributes) -> SpanHandle {
        degrade("evaluator", self.parent().map(|p| p.evaluator(attrs))).into()
    }

    fn guardrail(&self, attrs: SpanAttributes) -> SpanHandle {
        degrade("guardrail", self.parent().map(|p| p.guardrail(attrs))).into()
    }
}

#[derive(Debug, Clone)]
pub enum TraceHandle {
    Live(Trace),
    Null,
}

impl TraceHandle {
    pub fn is_null(&self) -> bool {
        matches!(self, TraceHandle::Null)
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            TraceHandle::Live(trace) => Some(trace.id()),
            TraceHandle::Null => None,
        }
    }

    pub fn url(&self) -> Option<String> {
        match self {
            TraceHandle::Live(trace) => Some(trace.url()),
            TraceHandle::Null => None,
        }
    }

    pub fn update(&mut self, update: TraceUpdate) -> &mut Self {
        if let TraceHandle::Live(trace) = self {
            trace.update(update);
        }
        self
    }

    pub fn score(&self, attrs: ScoreAttributes) {
        if let TraceHandle::Live(trace) = self {
            trace.score(attrs);
        }
    }

    pub fn to_body(&self) -> Map<String, Value> {
        match self {
            TraceHandle::Live(trace) => trace.to_body(),
            TraceHandle::Null => Map::new(),
        }
    }
}

impl HandleParent for TraceHandle {
    fn parent(&self) -> Option<&dyn ObservationParent> {
        match self {
            TraceHandle::Live(trace) => Some(trace),
            TraceHandle::Null => None,
        }
    }
}

impl From<Trace> for TraceHandle {
    fn from(trace: Trace) -> Self {
        TraceHandle::Live(trace)
    }
}

#[derive(Debug, Clone)]
pub enum SpanHandle {
    Live(Span),
    Null,
}

impl SpanHandle {
    pub fn is_null(&self) -> bool {
        matches!(self, SpanHandle::Null)
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            SpanHandle::Live(span) => Some(span.id()),
            SpanHandle::Null => None,
        }
    }

    pub fn trace_id(&self) -> Option<&str> {
        match self {
            SpanHandle::Live(span) => Some(span.trace_id()),
            SpanHandle::Null => None,
        }
    }

    pub fn url(&self) -> Option<String> {
        match self {
            SpanHandle::Live(span) => Some(span.url()),
            SpanHandle::Null => None,
        }
    }

    pub fn update(&mut self, update: SpanUpdate) -> &mut Self {
        if let SpanHandle::Live(span) = self {
            span.update(update);
        }
        self
    }

    pub fn end(
        &mut self,
        output: Option<Value>,
        end_time: Option<String>,
        usage: Option<Value>,
    ) -> &mut Self {
        if let SpanHandle::Live(span) = self {
            span.end(output, end_time, usage);
        }
        self
    }

    pub fn score(&self, attrs: ScoreAttributes) {
        if let SpanHandle::Live(span) = self {
            span.score(attrs);
        }
    }

    pub fn to_body(&self) -> Map<String, Value> {
        match self {
            SpanHandle::Live(span) => span.to_body(),
            SpanHandle::Null => Map::new(),
        }
    }
}

impl HandleParent for SpanHandle {
    fn parent(&self) -> Option<&dyn ObservationParent> {
        match self {
            SpanHandle::Live(span) => Some(span),
            SpanHandle::Null => None,
        }
    }
}

impl From<Option<Span>> for SpanHandle {
    fn from(span: Option<Span>) -> Self {
        span.map_or(SpanHandle::Null, SpanHandle::Live)
    }
}

#[derive(Debug, Clone)]
pub enum GenerationHandle {
    Live(Generation),
    Null,
}

impl GenerationHandle {
    pub fn is_null(&self) -> bool {
        matches!(self, GenerationHandle::Null)
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            GenerationHandle::Live(generation) => Some(generation.id()),
            GenerationHandle::Null => None,
        }
    }

    pub fn trace_id(&self) -> Option<&str> {
        match self {
            GenerationHandle::Live(generation) => Some(generation.trace_id()),
            GenerationHandle::Null => None,
        }
    }

    pub fn url(&self) -> Option<String> {
        match self {
            GenerationHandle::Live(generation) => Some(generation.url()),
            GenerationHandle::Null => None,
        }
    }

    pub fn update(&mut self, update: GenerationUpdate) -> &mut Self {
        if let GenerationHandle::Live(generation) = self {
            generation.update(update);
        }
        self
    }

    pub fn end(
        &mut self,
        output: Option<Value>,
        end_time: Option<String>,
        usage: Option<Value>,
    ) -> &mut Self {
        if let GenerationHandle::Live(generation) = self {
            generation.end(output, end_time, usage);
        }
        self
    }

    pub fn score(&self, attrs: ScoreAttributes) {
        if let GenerationHandle::Live(generation) = self {
            generation.score(attrs);
        }
    }

    pub fn to_body(&self) -> Map<String, Value> {
        match self {
            GenerationHandle::Live(generation) => generation.to_body(),
            GenerationHandle::Null => Map::new(),
        }
    }
}

impl HandleParent for GenerationHandle {
    fn parent(&self) -> Option<&dyn ObservationParent> {
        match self {
            GenerationHandle::Live(generation) => Some(generation),
            GenerationHandle::Null => None,
        }
    }
}

impl From<Option<Generation>> for GenerationHandle {
    fn from(generation: Option<Generation>) -> Self {
        generation.map_or(GenerationHandle::Null, GenerationHandle::Live)
    }
}

#[derive(Debug, Clone)]
pub enum EventHandle {
    Live(Event),
    Null,
}

impl EventHandle {
    pub fn is_null(&self) -> bool {
        matches!(self, EventHandle::Null)
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            EventHandle::Live(event) => Some(event.id()),
            EventHandle::Null => None,
        }
    }

    pub fn trace_id(&self) -> Option<&str> {
        match self {
            EventHandle::Live(event) => Some(event.trace_id()),
            EventHandle::Null => None,
        }
    }

    pub fn to_body(&self) -> Map<String, Value> {
        match self {
            EventHandle::Live(event) => event.to_body(),
            EventHandle::Null => Map::new(),
        }
    }
}

impl From<Option<Event>> for EventHandle {
    fn from(event: Option<Event>) -> Self {
        event.map_or(EventHandle::Null, EventHandle::Live)
    }
}
