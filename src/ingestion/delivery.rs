//! Delivery pipeline: drain the queue, send one batch, requeue on failure.

use super::event::QueuedEvent;
use super::queue::EventQueue;
use super::transport::{IngestionBatch, IngestionTransport};
use crate::error::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Moves queued events to an [`IngestionTransport`].
///
/// The queue lock is only held while draining and while requeueing, never across the
/// network call.
pub struct Delivery {
    queue: Arc<EventQueue>,
    transport: Arc<dyn IngestionTransport>,
    debug: bool,
}

impl Delivery {
    pub fn new(queue: Arc<EventQueue>, transport: Arc<dyn IngestionTransport>, debug: bool) -> Self {
        Self {
            queue,
            transport,
            debug,
        }
    }

    pub fn queue(&self) -> &Arc<EventQueue> {
        &self.queue
    }

    /// Deliver everything currently queued as one batch.
    ///
    /// On failure every drained event is put back at the tail of the queue, in order, and
    /// the error is returned to the caller.
    pub async fn flush(&self) -> Result<()> {
        if self.queue.is_empty() {
            return Ok(());
        }

        let drained = self.queue.drain_all();
        if drained.is_empty() {
            return Ok(());
        }

        let events = self.discard_malformed(drained);
        if events.is_empty() {
            debug!("No valid events to send");
            return Ok(());
        }

        let batch = IngestionBatch::new(&events);
        if self.debug {
            for event in &events {
                info!(
                    event_id = %event.id,
                    event_type = %event.kind,
                    timestamp = %event.timestamp,
                    "Sending event"
                );
            }
        }

        match self.transport.send_batch(&batch).await {
            Ok(response) => {
                if !response.errors.is_empty() {
                    warn!(
                        failed = response.errors.len(),
                        batch_size = events.len(),
                        "Ingestion endpoint rejected some events"
                    );
                }
                debug!(batch_size = events.len(), "Flushed events");
                Ok(())
            }
            Err(e) => {
                warn!(batch_size = events.len(), error = %e, "Failed to flush events, requeueing");
                self.queue.requeue(events);
                Err(e)
            }
        }
    }

    fn discard_malformed(&self, events: Vec<QueuedEvent>) -> Vec<QueuedEvent> {
        events
            .into_iter()
            .filter(|event| {
                if event.has_valid_body() {
                    true
                } else {
                    warn!(event_id = %event.id, event_type = %event.kind, "Event with empty body detected, skipping");
                    false
                }
            })
            .collect()
    }
}
