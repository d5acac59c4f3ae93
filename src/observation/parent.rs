//! Child-observation constructors shared by traces, spans and generations.

use super::attributes::{EmbeddingAttributes, EventAttributes, GenerationAttributes, SpanAttributes};
use super::event::Event;
use super::generation::Generation;
use super::span::Span;
use super::types::ObservationType;
use crate::client::Client;
use crate::error::Result;

/// Anything that can own child observations.
///
/// Children inherit the trace id. When the parent is itself an observation, the child's
/// `parentObservationId` is set to the parent's id.
pub trait ObservationParent {
    fn client(&self) -> &Client;

    fn trace_id(&self) -> &str;

    /// Id of the enclosing observation; `None` for a trace.
    fn observation_id(&self) -> Option<&str>;

    fn span(&self, mut attrs: SpanAttributes) -> Result<Span> {
        if let Some(parent) = self.observation_id() {
            attrs.parent_observation_id = Some(parent.to_string());
        }
        Span::create(self.client().clone(), self.trace_id().to_string(), attrs)
    }

    fn generation(&self, mut attrs: GenerationAttributes) -> Result<Generation> {
        if let Some(parent) = self.observation_id() {
            attrs.parent_observation_id = Some(parent.to_string());
        }
        Generation::create(self.client().clone(), self.trace_id().to_string(), attrs)
    }

    fn event(&self, mut attrs: EventAttributes) -> Result<Event> {
        if let Some(parent) = self.observation_id() {
            attrs.parent_observation_id = Some(parent.to_string());
        }
        Event::create(self.client().clone(), self.trace_id().to_string(), attrs)
    }

    /// A span-backed observation with `as_type` preset to `kind`.
    fn typed_span(&self, kind: ObservationType, mut attrs: SpanAttributes) -> Result<Span> {
        attrs.as_type = Some(kind.as_str().to_string());
        self.span(attrs)
    }

    fn agent(&self, attrs: SpanAttributes) -> Result<Span> {
        self.typed_span(ObservationType::Agent, attrs)
    }

    fn tool(&self, attrs: SpanAttributes) -> Result<Span> {
        self.typed_span(ObservationType::Tool, attrs)
    }

    fn chain(&self, attrs: SpanAttributes) -> Result<Span> {
        self.typed_span(ObservationType::Chain, attrs)
    }

    fn retriever(&self, attrs: SpanAttributes) -> Result<Span> {
        self.typed_span(ObservationType::Retriever, attrs)
    }

    fn embedding(&self, attrs: EmbeddingAttributes) -> Result<Span> {
        self.span(attrs.into_span_attributes())
    }

    fn evaluator(&self, attrs: SpanAttributes) -> Result<Span> {
        self.typed_span(ObservationType::Evaluator, attrs)
    }

    fn guardrail(&self, attrs: SpanAttributes) -> Result<Span> {
        self.typed_span(ObservationType::Guardrail, attrs)
    }
}
