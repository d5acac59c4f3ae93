//! Event buffering and delivery.
//!
//! Builders push create/update events into the [`EventQueue`]. A [`Delivery`] drains the
//! queue into one batch and hands it to an [`IngestionTransport`]; failed batches go back
//! into the queue. The [`BackgroundFlusher`] runs `Delivery::flush` on an interval.
//!
//! # Architecture
//!
//! - **EventQueue**: lock-protected ordered queue with `trace-update` coalescing
//! - **Delivery**: drain → filter → send → requeue-on-failure
//! - **BackgroundFlusher**: cancellable periodic tokio task
//! - **IngestionTransport**: seam for the HTTP client (or [`MemoryTransport`] in tests)

pub mod delivery;
pub mod event;
pub mod flusher;
pub mod queue;
pub mod transport;

pub use delivery::Delivery;
pub use event::{EventKind, QueuedEvent, UnknownEventKind};
pub use flusher::BackgroundFlusher;
pub use queue::{EnqueueOutcome, EventQueue};
pub use transport::{
    BatchMetadata, IngestionBatch, IngestionResponse, IngestionTransport, MemoryTransport,
    SDK_NAME, SDK_VERSION,
};
