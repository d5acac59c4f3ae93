//! Thread-safe queue of pending outbound events.
//!
//! The queue is the only state shared between application threads and the background
//! flusher. Every operation takes the lock once, so the trace-update coalescing scan and
//! merge are atomic with respect to concurrent enqueues and drains.

use super::event::{EventKind, QueuedEvent};
use crate::utils::{current_timestamp, merge_into};
use serde_json::{Map, Value};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// What `enqueue` did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Appended at the tail.
    Appended,
    /// Merged into a pending `trace-create` for the same trace.
    Coalesced,
    /// A `trace-update` with no pending create, appended as `trace-create`.
    ConvertedToCreate,
    /// Rejected: unknown type or an update without a target id.
    Dropped,
}

/// Ordered, lock-protected collection of [`QueuedEvent`]s.
pub struct EventQueue {
    events: Mutex<Vec<QueuedEvent>>,
    debug: bool,
}

impl EventQueue {
    /// Create an empty queue.
    ///
    /// # Arguments
    ///
    /// * `debug` - Surface dropped/coalesced events at `warn`/`info` instead of `debug`
    pub fn new(debug: bool) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            debug,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<QueuedEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueue an event by its wire type name.
    ///
    /// Unrecognized type names are logged and dropped; enqueueing never fails.
    pub fn enqueue(&self, event_type: &str, body: Map<String, Value>) -> EnqueueOutcome {
        match event_type.parse::<EventKind>() {
            Ok(kind) => self.enqueue_kind(kind, body),
            Err(err) => {
                if self.debug {
                    warn!(event_type, "Invalid event type, skipping event: {}", err);
                } else {
                    debug!(event_type, "Invalid event type, skipping event: {}", err);
                }
                EnqueueOutcome::Dropped
            }
        }
    }

    /// Enqueue a typed event, coalescing `trace-update` into a pending `trace-create`.
    pub fn enqueue_kind(&self, kind: EventKind, body: Map<String, Value>) -> EnqueueOutcome {
        let mut event = QueuedEvent::new(kind, body);

        if kind != EventKind::TraceUpdate {
            let event_id = event.id.clone();
            self.lock().push(event);
            debug!(event_type = %kind, event_id = %event_id, "Enqueued event");
            return EnqueueOutcome::Appended;
        }

        let Some(trace_id) = event.target_id().map(str::to_string) else {
            if self.debug {
                warn!("trace-update event missing trace id, skipping");
            } else {
                debug!("trace-update event missing trace id, skipping");
            }
            return EnqueueOutcome::Dropped;
        };

        let mut events = self.lock();
        let pending = events.iter_mut().find(|existing| {
            existing.kind == EventKind::TraceCreate && existing.target_id() == Some(trace_id.as_str())
        });

        match pending {
            Some(existing) => {
                if let (Value::Object(target), Value::Object(update)) =
                    (&mut existing.body, std::mem::take(&mut event.body))
                {
                    merge_into(target, update);
                }
                existing.timestamp = current_timestamp();
                drop(events);
                self.log_info(&trace_id, "Updated existing trace-create event");
                EnqueueOutcome::Coalesced
            }
            None => {
                event.kind = EventKind::TraceCreate;
                events.push(event);
                drop(events);
                self.log_info(&trace_id, "Converted trace-update to trace-create");
                EnqueueOutcome::ConvertedToCreate
            }
        }
    }

    fn log_info(&self, trace_id: &str, message: &str) {
        if self.debug {
            tracing::info!(trace_id, "{}", message);
        } else {
            debug!(trace_id, "{}", message);
        }
    }

    /// Atomically take every pending event, in insertion order.
    pub fn drain_all(&self) -> Vec<QueuedEvent> {
        std::mem::take(&mut *self.lock())
    }

    /// Put previously drained events back at the tail, preserving their order.
    ///
    /// Requeued events bypass coalescing.
    pub fn requeue(&self, events: Vec<QueuedEvent>) {
        if events.is_empty() {
            return;
        }
        self.lock().extend(events);
    }

    /// Copy of the pending events, for inspection.
    pub fn snapshot(&self) -> Vec<QueuedEvent> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    fn body(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_enqueue_appends_in_order() {
        let queue = EventQueue::default();

        queue.enqueue("span-create", body(json!({"id": "s1"})));
        queue.enqueue("generation-create", body(json!({"id": "g1"})));
        queue.enqueue("event-create", body(json!({"id": "e1"})));

        let kinds: Vec<_> = queue.snapshot().iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![EventKind::SpanCreate, EventKind::GenerationCreate, EventKind::EventCreate]
        );
    }

    #[test]
    fn test_unknown_type_is_dropped() {
        let queue = EventQueue::new(true);
        queue.enqueue("span-create", body(json!({"id": "s1"})));

        let outcome = queue.enqueue("test", body(json!({"id": "x"})));

        assert_eq!(outcome, EnqueueOutcome::Dropped);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_trace_update_coalesces_into_pending_create() {
        let queue = EventQueue::default();
        queue.enqueue("trace-create", body(json!({"id": "t1", "name": "a"})));

        let outcome = queue.enqueue("trace-update", body(json!({"id": "t1", "output": "x"})));

        assert_eq!(outcome, EnqueueOutcome::Coalesced);
        let events = queue.snapshot();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::TraceCreate);
        assert_eq!(events[0].body, json!({"id": "t1", "name": "a", "output": "x"}));
    }

    #[test]
    fn test_repeated_updates_keep_last_value() {
        let queue = EventQueue::default();
        queue.enqueue("trace-create", body(json!({"id": "t1", "name": "first"})));

        for i in 0..5 {
            queue.enqueue("trace-update", body(json!({"id": "t1", "name": format!("v{}", i)})));
        }

        let events = queue.snapshot();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].body["name"], "v4");
    }

    #[test]
    fn test_coalescing_only_touches_matching_trace() {
        let queue = EventQueue::default();
        queue.enqueue("trace-create", body(json!({"id": "t1", "name": "one"})));
        queue.enqueue("trace-create", body(json!({"id": "t2", "name": "two"})));

        queue.enqueue("trace-update", body(json!({"id": "t2", "name": "updated"})));

        let events = queue.snapshot();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].body["name"], "one");
        assert_eq!(events[1].body["name"], "updated");
    }

    #[test]
    fn test_trace_update_without_create_becomes_create() {
        let queue = EventQueue::default();

        let outcome = queue.enqueue("trace-update", body(json!({"id": "t9", "output": "late"})));

        assert_eq!(outcome, EnqueueOutcome::ConvertedToCreate);
        let events = queue.snapshot();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::TraceCreate);
        assert_eq!(events[0].body, json!({"id": "t9", "output": "late"}));
    }

    #[test]
    fn test_trace_update_without_id_is_dropped() {
        let queue = EventQueue::default();

        let outcome = queue.enqueue("trace-update", body(json!({"name": "orphan"})));

        assert_eq!(outcome, EnqueueOutcome::Dropped);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_span_updates_are_not_coalesced() {
        let queue = EventQueue::default();
        queue.enqueue("span-create", body(json!({"id": "s1"})));
        queue.enqueue("span-update", body(json!({"id": "s1", "output": "a"})));
        queue.enqueue("span-update", body(json!({"id": "s1", "output": "b"})));

        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn test_drain_then_requeue_restores_content_and_order() {
        let queue = EventQueue::default();
        queue.enqueue("trace-create", body(json!({"id": "t1"})));
        queue.enqueue("span-create", body(json!({"id": "s1"})));
        queue.enqueue("score-create", body(json!({"id": "sc1"})));
        let before = queue.snapshot();

        let drained = queue.drain_all();
        assert!(queue.is_empty());
        queue.requeue(drained);

        assert_eq!(queue.snapshot(), before);
    }

    #[test]
    fn test_requeue_goes_to_tail_without_coalescing() {
        let queue = EventQueue::default();
        queue.enqueue("trace-create", body(json!({"id": "t1"})));
        let drained = queue.drain_all();

        queue.enqueue("span-create", body(json!({"id": "s1"})));
        queue.requeue(drained);

        let events = queue.snapshot();
        assert_eq!(events[0].kind, EventKind::SpanCreate);
        assert_eq!(events[1].kind, EventKind::TraceCreate);
    }

    #[test]
    fn test_concurrent_enqueue_and_drain_partition() {
        let queue = Arc::new(EventQueue::default());
        let producers = 8;
        let per_producer = 250;

        let mut handles = Vec::new();
        for p in 0..producers {
            let queue = Arc::clone(&queue);
            handles.push(thread::spawn(move || {
                for i in 0..per_producer {
                    queue.enqueue("span-create", body(json!({"id": format!("{}-{}", p, i)})));
                }
            }));
        }

        let mut drainers = Vec::new();
        for _ in 0..3 {
            let queue = Arc::clone(&queue);
            drainers.push(thread::spawn(move || {
                let mut seen = Vec::new();
                for _ in 0..50 {
                    seen.extend(queue.drain_all());
                    thread::yield_now();
                }
                seen
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }
        let mut delivered: Vec<QueuedEvent> = Vec::new();
        for drainer in drainers {
            delivered.extend(drainer.join().unwrap());
        }
        delivered.extend(queue.drain_all());

        let ids: HashSet<String> =
            delivered.iter().map(|e| e.target_id().unwrap().to_string()).collect();
        assert_eq!(delivered.len(), producers * per_producer);
        assert_eq!(ids.len(), producers * per_producer);
    }

    #[test]
    fn test_concurrent_trace_updates_coalesce() {
        let queue = Arc::new(EventQueue::default());
        queue.enqueue("trace-create", body(json!({"id": "t1"})));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    let key = format!("k{}", i);
                    queue.enqueue("trace-update", body(json!({"id": "t1", key: i})));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let events = queue.snapshot();
        assert_eq!(events.len(), 1);
        for i in 0..8 {
            assert_eq!(events[0].body[format!("k{}", i)], json!(i));
        }
    }
}
