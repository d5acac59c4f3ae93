//! Basic tracing walkthrough.
//!
//! Creates a trace with a nested span, a generation, an event and a score, then shuts the
//! client down so everything is delivered before the process exits.
//!
//! # Running the example
//!
//! ```bash
//! export LANGFUSE_PUBLIC_KEY=pk-lf-...
//! export LANGFUSE_SECRET_KEY=sk-lf-...
//! cargo run --example basic_tracing
//! ```
//!
//! A `.env` file in the working directory is picked up as well.

use anyhow::Result;
use langfuse::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let client = Client::from_env()?;
    println!("Connected to {}", client.host());

    let mut trace = client.trace(
        TraceAttributes::new("support-chat")
            .user_id("user-42")
            .session_id("session-7")
            .input(json!({"question": "How do I reset my password?"}))
            .tags(["demo", "rust"]),
    );

    let mut retrieval = trace.retriever(
        SpanAttributes::new("search-knowledge-base").input(json!({"query": "reset password"})),
    )?;
    retrieval.end(Some(json!({"documents": 3})), None, None);

    let mut generation = trace.generation(
        GenerationAttributes::new("answer")
            .model("gpt-4o-mini")
            .model_parameters(json!({"temperature": 0.2}))
            .input(json!([{"role": "user", "content": "How do I reset my password?"}])),
    )?;
    generation.event(EventAttributes::new("first-token"))?;
    generation.end(
        Some(json!("Open Settings, then Security, then choose Reset password.")),
        None,
        Some(json!({"input": 24, "output": 12})),
    );

    trace.update(TraceUpdate::output(json!("Open Settings, then Security...")));
    trace.score(ScoreAttributes::new("helpfulness", 0.9).comment("demo score"));

    println!("Trace: {}", trace.url());
    println!("Queued events: {}", client.queue_len());

    client.shutdown().await?;
    println!("Delivered.");
    Ok(())
}
