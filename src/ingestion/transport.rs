//! Transport seam between the delivery pipeline and the ingestion endpoint.

use super::event::QueuedEvent;
use crate::error::{LangfuseError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

pub const SDK_NAME: &str = "langfuse-rust";
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Wire envelope: `{ batch: [...], metadata: { batchSize, sdkName, sdkVersion } }`.
#[derive(Debug, Serialize)]
pub struct IngestionBatch<'a> {
    pub batch: &'a [QueuedEvent],
    pub metadata: BatchMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchMetadata {
    pub batch_size: usize,
    pub sdk_name: String,
    pub sdk_version: String,
}

impl<'a> IngestionBatch<'a> {
    pub fn new(events: &'a [QueuedEvent]) -> Self {
        Self {
            batch: events,
            metadata: BatchMetadata {
                batch_size: events.len(),
                sdk_name: SDK_NAME.to_string(),
                sdk_version: SDK_VERSION.to_string(),
            },
        }
    }
}

/// Per-event outcome reported by the ingestion endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IngestionResponse {
    #[serde(default)]
    pub successes: Vec<IngestionSuccess>,
    #[serde(default)]
    pub errors: Vec<IngestionFailure>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IngestionSuccess {
    pub id: String,
    #[serde(default)]
    pub status: u16,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IngestionFailure {
    pub id: String,
    #[serde(default)]
    pub status: u16,
    #[serde(default)]
    pub message: Option<String>,
}

/// Something that can deliver a batch of events.
#[async_trait]
pub trait IngestionTransport: Send + Sync {
    /// Send one batch. An `Err` means the whole batch is treated as undelivered.
    async fn send_batch(&self, batch: &IngestionBatch<'_>) -> Result<IngestionResponse>;
}

/// In-process transport that records every batch it accepts.
///
/// Failures can be scripted with [`fail_next`](Self::fail_next) to exercise the requeue
/// path without a server.
#[derive(Default)]
pub struct MemoryTransport {
    sent: Mutex<Vec<Vec<QueuedEvent>>>,
    failures: Mutex<VecDeque<LangfuseError>>,
    calls: Mutex<usize>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `send_batch` call fail with `error`.
    pub fn fail_next(&self, error: LangfuseError) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(error);
    }

    /// Batches accepted so far.
    pub fn sent_batches(&self) -> Vec<Vec<QueuedEvent>> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// All accepted events, flattened in delivery order.
    pub fn sent_events(&self) -> Vec<QueuedEvent> {
        self.sent_batches().into_iter().flatten().collect()
    }

    /// Number of `send_batch` calls, successful or not.
    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl IngestionTransport for MemoryTransport {
    async fn send_batch(&self, batch: &IngestionBatch<'_>) -> Result<IngestionResponse> {
        *self.calls.lock().unwrap_or_else(PoisonError::into_inner) += 1;

        let failure = self
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        if let Some(error) = failure {
            return Err(error);
        }

        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(batch.batch.to_vec());

        Ok(IngestionResponse {
            successes: batch
                .batch
                .iter()
                .map(|e| IngestionSuccess {
                    id: e.id.clone(),
                    status: 201,
                })
                .collect(),
            errors: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::event::EventKind;
    use serde_json::{json, Map};

    #[test]
    fn test_batch_envelope_uses_camel_case_metadata() {
        let events = vec![
            QueuedEvent::new(EventKind::TraceCreate, Map::new()),
            QueuedEvent::new(EventKind::SpanCreate, Map::new()),
        ];

        let value = serde_json::to_value(IngestionBatch::new(&events)).unwrap();

        assert_eq!(value["metadata"]["batchSize"], 2);
        assert_eq!(value["metadata"]["sdkName"], SDK_NAME);
        assert_eq!(value["metadata"]["sdkVersion"], SDK_VERSION);
        assert_eq!(value["batch"].as_array().unwrap().len(), 2);
        assert_eq!(value["batch"][1]["type"], "span-create");
    }

    #[test]
    fn test_ingestion_response_parses_leniently() {
        let response: IngestionResponse = serde_json::from_value(json!({
            "successes": [{"id": "a", "status": 201}],
            "errors": [{"id": "b", "status": 400, "message": "bad body"}]
        }))
        .unwrap();
        assert_eq!(response.successes.len(), 1);
        assert_eq!(response.errors[0].message.as_deref(), Some("bad body"));

        let empty: IngestionResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty, IngestionResponse::default());
    }

    #[tokio::test]
    async fn test_memory_transport_records_and_fails() {
        let transport = MemoryTransport::new();
        let events = vec![QueuedEvent::new(EventKind::EventCreate, Map::new())];

        transport.fail_next(LangfuseError::NetworkError("down".to_string()));
        let first = transport.send_batch(&IngestionBatch::new(&events)).await;
        let second = transport.send_batch(&IngestionBatch::new(&events)).await;

        assert!(matches!(first, Err(LangfuseError::NetworkError(_))));
        assert_eq!(second.unwrap().successes.len(), 1);
        assert_eq!(transport.call_count(), 2);
        assert_eq!(transport.sent_events(), events);
    }
}
