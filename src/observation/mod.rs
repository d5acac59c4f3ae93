//! Observation builders: traces, spans, generations and events.
//!
//! A builder is created by its parent ([`Client`](crate::Client), [`Trace`], [`Span`] or
//! [`Generation`]) and enqueues its `*-create` event as part of construction. Later
//! `update`/`end` calls enqueue `*-update` events carrying the cumulative state. Builders
//! are never read back from the queue.

pub mod attributes;
pub mod event;
pub mod generation;
pub mod handle;
pub mod parent;
pub mod span;
pub mod trace;
pub mod types;

pub use attributes::{
    to_map, EmbeddingAttributes, EventAttributes, GenerationAttributes, GenerationUpdate,
    ScoreAttributes, ScoreDataType, SpanAttributes, SpanUpdate, TraceAttributes, TraceUpdate,
};
pub use event::Event;
pub use generation::Generation;
pub use handle::{EventHandle, GenerationHandle, HandleParent, SpanHandle, TraceHandle};
pub use parent::ObservationParent;
pub use span::Span;
pub use trace::Trace;
pub use types::{ObservationLevel, ObservationType};

use crate::client::Client;
use crate::ingestion::EventKind;
use crate::utils::to_body;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

/// Serialize `state` (plus `extra`) and enqueue it as `kind`. Keys in `omit` are removed
/// from the body first.
///
/// Serialization problems are logged; builders never fail after validation.
pub(crate) fn enqueue_state<T: Serialize>(
    client: &Client,
    kind: EventKind,
    state: &T,
    extra: &Map<String, Value>,
    omit: &[&str],
) {
    match to_body(state, extra) {
        Ok(mut body) => {
            for key in omit {
                body.remove(*key);
            }
            client.enqueue_kind(kind, body);
        }
        Err(e) => {
            warn!(event_type = %kind, error = %e, "Failed to serialize observation, skipping event");
        }
    }
}

/// Overwrite `target` when `source` carries a value.
pub(crate) fn overwrite<T>(target: &mut Option<T>, source: Option<T>) {
    if source.is_some() {
        *target = source;
    }
}
