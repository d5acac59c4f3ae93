//! Periodic background flush task.
//!
//! The flusher sleeps for the configured interval, flushes the queue if it has anything
//! in it, and repeats until cancelled. Cancellation interrupts the sleep immediately;
//! a flush that is already running completes (and requeues on failure) before the task
//! exits.

use super::delivery::Delivery;
use crate::error::{LangfuseError, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Handle to a running flush loop. Dropping it cancels the loop.
pub struct BackgroundFlusher {
    cancel_tx: watch::Sender<bool>,
    task_handle: Option<JoinHandle<()>>,
}

impl BackgroundFlusher {
    /// Spawn the flush loop on the current tokio runtime.
    ///
    /// Returns `None` when called outside a runtime; the caller then has to flush manually.
    pub fn start(delivery: Arc<Delivery>, interval: Duration) -> Option<Self> {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!("No tokio runtime available; automatic flushing is disabled");
                return None;
            }
        };

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let handle = runtime.spawn(Self::flush_loop(delivery, interval, cancel_rx));
        info!(interval_secs = interval.as_secs_f64(), "Background flusher started");

        Some(Self {
            cancel_tx,
            task_handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.task_handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Signal the loop to stop without waiting for it.
    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
    }

    /// Signal the loop to stop and wait until it has exited.
    pub async fn stop(mut self) -> Result<()> {
        self.cancel();
        if let Some(handle) = self.task_handle.take() {
            debug!("Waiting for background flusher to exit");
            handle.await.map_err(|e| {
                LangfuseError::ConfigError(format!("Background flusher failed to stop: {}", e))
            })?;
            info!("Background flusher stopped");
        }
        Ok(())
    }

    async fn flush_loop(
        delivery: Arc<Delivery>,
        interval: Duration,
        mut cancel_rx: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                changed = cancel_rx.changed() => {
                    // A closed channel means the handle was dropped.
                    if changed.is_err() || *cancel_rx.borrow() {
                        break;
                    }
                    continue;
                }
                _ = tokio::time::sleep(interval) => {}
            }

            if *cancel_rx.borrow() {
                break;
            }

            if delivery.queue().is_empty() {
                continue;
            }

            if let Err(e) = delivery.flush().await {
                error!(error = %e, "Error in background flush");
            }
        }

        debug!("Flush loop exiting");
    }
}

impl Drop for BackgroundFlusher {
    fn drop(&mut self) {
        self.cancel();
    }
}
