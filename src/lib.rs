//! Client SDK for the Langfuse LLM observability platform.
//!
//! Build traces, spans, generations and events with a [`Client`]. Every builder call
//! enqueues an ingestion event; a background task (or an explicit [`Client::flush`])
//! delivers queued events to `/api/public/ingestion` in batches. Failed deliveries are
//! put back in the queue so nothing is lost between attempts.
//!
//! ```no_run
//! use langfuse::prelude::*;
//!
//! # async fn run() -> langfuse::Result<()> {
//! let client = Client::new(ClientOptions::with_keys("pk-lf-...", "sk-lf-..."))?;
//!
//! let mut trace = client.trace(TraceAttributes::new("chat").user_id("user-1"));
//! let mut generation = trace.generation(GenerationAttributes::new("completion").model("gpt-4o"))?;
//! generation.end(Some(json!("Hello!")), None, Some(json!({"input": 12, "output": 3})));
//! trace.update(TraceUpdate::output(json!("Hello!")));
//!
//! client.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod ingestion;
pub mod observation;
pub mod prompt;
pub mod registry;
pub mod utils;

pub use client::Client;
pub use config::{ClientConfig, ClientOptions, Configuration};
pub use error::{LangfuseError, Result};
pub use prompt::{CreatePromptRequest, Prompt};
pub use registry::ClientRegistry;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::client::Client;
    pub use crate::config::{ClientOptions, Configuration};
    pub use crate::error::{LangfuseError, Result};
    pub use crate::evaluation::{
        ContainsEvaluator, EvaluationScore, Evaluator, ExactMatchEvaluator, LengthEvaluator,
        RegexEvaluator, SimilarityEvaluator,
    };
    pub use crate::observation::{
        EmbeddingAttributes, EventAttributes, GenerationAttributes, GenerationUpdate,
        HandleParent, ObservationLevel, ObservationParent, ObservationType, ScoreAttributes,
        ScoreDataType, SpanAttributes, SpanUpdate, TraceAttributes, TraceUpdate,
    };
    pub use crate::prompt::{CreatePromptRequest, Prompt};
    pub use crate::registry::ClientRegistry;
    pub use serde_json::json;
}
