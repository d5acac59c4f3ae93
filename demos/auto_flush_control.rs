//! Choosing between background and manual flushing.
//!
//! The first client flushes on a short interval in the background. The second has
//! auto-flush turned off and delivers only when `flush` is called.
//!
//! ```bash
//! cargo run --example auto_flush_control
//! ```

use anyhow::Result;
use langfuse::prelude::*;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    println!("=== Background flushing ===");
    let background = Client::new(ClientOptions::default().flush_interval(Duration::from_secs(1)))?;
    println!("auto flush running: {}", background.is_auto_flushing());

    let trace = background.trace(TraceAttributes::new("background-flush"));
    trace.event(EventAttributes::new("tick"))?;
    println!("queued before interval: {}", background.queue_len());

    tokio::time::sleep(Duration::from_millis(1500)).await;
    println!("queued after interval: {}", background.queue_len());
    background.shutdown().await?;

    println!("\n=== Manual flushing ===");
    let manual = Client::new(ClientOptions::default().auto_flush(false))?;
    println!("auto flush running: {}", manual.is_auto_flushing());

    for step in 0..3 {
        let trace = manual.trace(TraceAttributes::new(format!("manual-{step}")));
        let mut span = trace.span(SpanAttributes::new("work"))?;
        span.end(Some(json!({"step": step})), None, None);
    }
    println!("queued before flush: {}", manual.queue_len());

    if let Err(e) = manual.flush().await {
        eprintln!("flush failed, events kept for retry: {e}");
    }
    println!("queued after flush: {}", manual.queue_len());

    manual.shutdown().await?;
    Ok(())
}
