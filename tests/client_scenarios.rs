//! End-to-end behavior of the public API against an in-memory transport.

use langfuse::ingestion::{EventKind, EventQueue, MemoryTransport};
use langfuse::prelude::*;
use langfuse::ClientConfig;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn config(auto_flush: bool) -> ClientConfig {
    ClientConfig {
        public_key: "pk-test".to_string(),
        secret_key: "sk-test".to_string(),
        host: "https://langfuse.test".to_string(),
        debug: true,
        timeout: Duration::from_secs(5),
        retries: 0,
        flush_interval: Duration::from_secs(3600),
        auto_flush,
    }
}

fn client(auto_flush: bool) -> (Client, Arc<MemoryTransport>) {
    let transport = Arc::new(MemoryTransport::new());
    let client = Client::with_transport(config(auto_flush), transport.clone()).unwrap();
    (client, transport)
}

fn body(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

#[test]
fn trace_update_merges_into_pending_create() {
    let queue = EventQueue::new(false);

    queue.enqueue("trace-create", body(json!({"id": "t1", "name": "a"})));
    queue.enqueue("trace-update", body(json!({"id": "t1", "output": "x"})));

    let events = queue.snapshot();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, EventKind::TraceCreate);
    assert_eq!(events[0].body, json!({"id": "t1", "name": "a", "output": "x"}));
}

#[test]
fn repeated_trace_updates_keep_one_create_with_latest_values() {
    let (client, _transport) = client(false);
    let mut trace = client.trace(TraceAttributes::new("conversation"));

    trace.update(TraceUpdate::output(json!("first")));
    trace.update(TraceUpdate::output(json!("second")));
    trace.update(TraceUpdate {
        user_id: Some("user-9".to_string()),
        ..Default::default()
    });

    let events = client.queued_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, EventKind::TraceCreate);
    assert_eq!(events[0].body["output"], json!("second"));
    assert_eq!(events[0].body["userId"], json!("user-9"));
    assert_eq!(events[0].body["name"], json!("conversation"));
}

#[tokio::test]
async fn trace_update_after_flush_becomes_create() {
    let (client, transport) = client(false);
    let mut trace = client.trace(TraceAttributes::new("late"));
    client.flush().await.unwrap();

    trace.update(TraceUpdate::output(json!("done")));

    let events = client.queued_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, EventKind::TraceCreate);
    assert_eq!(events[0].body["id"], json!(trace.id()));
    assert_eq!(transport.sent_events().len(), 1);
}

#[test]
fn extra_fields_cannot_replace_identity() {
    let (client, _transport) = client(false);
    let trace = client.trace(
        TraceAttributes::new("a")
            .id("t1")
            .extra("id", json!("other"))
            .extra("environment", json!("staging")),
    );
    let span = trace
        .span(
            SpanAttributes::new("child")
                .as_type("agent")
                .extra("traceId", json!("elsewhere"))
                .extra("type", json!("tool")),
        )
        .unwrap();

    let events = client.queued_events();
    assert_eq!(trace.id(), "t1");
    assert_eq!(events[0].body["id"], json!("t1"));
    assert_eq!(events[0].body["environment"], json!("staging"));
    assert_eq!(events[1].body["id"], json!(span.id()));
    assert_eq!(events[1].body["traceId"], json!("t1"));
    assert_eq!(events[1].body["type"], json!("agent"));
}

#[test]
fn unknown_event_type_is_dropped() {
    let (client, _transport) = client(false);

    client.enqueue("observation-create", body(json!({"id": "x"})));

    assert_eq!(client.queue_len(), 0);
}

#[test]
fn invalid_span_type_fails_before_enqueue() {
    let (client, _transport) = client(false);
    let trace = client.trace(TraceAttributes::new("root"));
    let before = client.queue_len();

    let result = trace.span(SpanAttributes::new("bad").as_type("bogus"));

    match result {
        Err(LangfuseError::ValidationError(message)) => {
            assert!(message.contains("bogus"));
            assert!(message.contains("generation"));
        }
        other => panic!("Expected ValidationError, got {:?}", other.map(|s| s.id().to_string())),
    }
    assert_eq!(client.queue_len(), before);
}

#[tokio::test]
async fn empty_flush_makes_no_call() {
    let (client, transport) = client(false);

    client.flush().await.unwrap();

    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn failed_flush_keeps_every_event_in_order() {
    let (client, transport) = client(false);
    let trace = client.trace(TraceAttributes::new("root"));
    let mut span = trace.span(SpanAttributes::new("step")).unwrap();
    span.end(None, None, None);
    let before = client.queued_events();

    transport.fail_next(LangfuseError::ApiError("Server error (503): down".to_string()));
    let result = client.flush().await;

    assert!(matches!(result, Err(LangfuseError::ApiError(_))));
    assert_eq!(client.queued_events(), before);

    client.flush().await.unwrap();
    assert_eq!(transport.sent_events(), before);
    assert_eq!(client.queue_len(), 0);
}

#[tokio::test]
async fn shutdown_stops_flusher_and_flushes_once() {
    let (client, transport) = client(true);
    assert!(client.is_auto_flushing());
    client.trace(TraceAttributes::new("pending"));

    client.shutdown().await.unwrap();

    assert!(!client.is_auto_flushing());
    assert_eq!(transport.call_count(), 1);
    assert_eq!(client.queue_len(), 0);
}

#[tokio::test]
async fn shutdown_surfaces_final_flush_error() {
    let (client, transport) = client(true);
    client.trace(TraceAttributes::new("pending"));
    transport.fail_next(LangfuseError::RateLimitError("slow down".to_string()));

    let result = client.shutdown().await;

    assert!(matches!(result, Err(LangfuseError::RateLimitError(_))));
    assert_eq!(client.queue_len(), 1);
}

#[test]
fn nested_observations_link_to_parents() {
    let (client, _transport) = client(false);
    let trace = client.trace(TraceAttributes::new("root"));
    let span = trace.agent(SpanAttributes::new("planner")).unwrap();
    let generation = span
        .generation(GenerationAttributes::new("llm").model("gpt-4o"))
        .unwrap();
    generation.event(EventAttributes::new("token")).unwrap();

    let events = client.queued_events();
    let kinds: Vec<EventKind> = events.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::TraceCreate,
            EventKind::SpanCreate,
            EventKind::GenerationCreate,
            EventKind::EventCreate,
        ]
    );
    assert_eq!(events[1].body["type"], json!("agent"));
    assert_eq!(events[2].body["parentObservationId"], json!(span.id()));
    assert_eq!(events[3].body["parentObservationId"], json!(generation.id()));
    for event in &events[1..] {
        assert_eq!(event.body["traceId"], json!(trace.id()));
    }
}

#[test]
fn concurrent_enqueue_and_drain_partition_events() {
    const PRODUCERS: usize = 4;
    const PER_PRODUCER: usize = 250;

    let queue = Arc::new(EventQueue::new(false));

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..PER_PRODUCER {
                    queue.enqueue("event-create", body(json!({"id": format!("{p}-{i}")})));
                }
            })
        })
        .collect();

    let drainer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            let mut drained = Vec::new();
            for _ in 0..50 {
                drained.extend(queue.drain_all());
                thread::yield_now();
            }
            drained
        })
    };

    for producer in producers {
        producer.join().unwrap();
    }
    let mut drained = drainer.join().unwrap();
    drained.extend(queue.drain_all());

    let ids: Vec<String> = drained
        .iter()
        .filter_map(|e| e.target_id().map(str::to_string))
        .collect();
    let unique: HashSet<&String> = ids.iter().collect();
    assert_eq!(ids.len(), PRODUCERS * PER_PRODUCER);
    assert_eq!(unique.len(), ids.len());
}

#[test]
fn manual_flush_works_without_async_runtime() {
    let (client, transport) = client(false);
    client.trace(TraceAttributes::new("sync-caller"));

    tokio_test::block_on(client.flush()).unwrap();

    assert_eq!(transport.sent_events().len(), 1);
}

#[test]
fn registry_degrades_without_credentials() {
    let registry = ClientRegistry::new(ClientOptions::with_keys("", ""), Configuration::default());

    let trace = registry.trace(TraceAttributes::new("root"));
    let mut span = trace.span(SpanAttributes::new("child"));
    span.end(Some(json!("ignored")), None, None);

    assert!(trace.is_null());
    assert!(span.is_null());
}
