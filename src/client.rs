//! The Langfuse client: configuration, observation entry points and lifecycle.
//!
//! A [`Client`] owns the event queue, the delivery pipeline and (when auto-flush is on)
//! the background flusher. It is cheap to clone; clones share all of that state, and the
//! flusher is cancelled when the last clone is dropped.
//!
//! # Examples
//!
//! ```ignore
//! use langfuse::prelude::*;
//!
//! let client = Client::new(ClientOptions::with_keys("pk-lf-...", "sk-lf-..."))?;
//! let trace = client.trace(TraceAttributes::new("chat").user_id("user-1"));
//! let mut generation = trace.generation(GenerationAttributes::new("answer").model("gpt-4o"))?;
//! generation.end(Some(json!("Hello!")), None, Some(json!({"input": 5, "output": 2})));
//! client.shutdown().await?;
//! ```

use crate::api::ApiClient;
use crate::config::{ClientConfig, ClientOptions, Configuration};
use crate::error::{LangfuseError, Result};
use crate::ingestion::{
    BackgroundFlusher, Delivery, EnqueueOutcome, EventKind, EventQueue, IngestionTransport,
    QueuedEvent,
};
use crate::observation::{
    EmbeddingAttributes, Event, EventAttributes, Generation, GenerationAttributes,
    ObservationType, ScoreAttributes, Span, SpanAttributes, Trace, TraceAttributes,
};
use crate::prompt::{self, CreatePromptRequest, Prompt, PromptCache, PromptKey};
use crate::utils::{generate_id, to_body};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default time a fetched prompt is served from the cache.
pub const DEFAULT_PROMPT_CACHE_TTL: Duration = Duration::from_secs(60);

/// Entry point for tracing, scoring and prompt management.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: ClientConfig,
    queue: Arc<EventQueue>,
    delivery: Arc<Delivery>,
    api: ApiClient,
    flusher: Mutex<Option<BackgroundFlusher>>,
    prompts: PromptCache,
}

impl Client {
    /// Build a client from explicit options, the environment and the built-in defaults.
    ///
    /// # Errors
    ///
    /// [`LangfuseError::AuthenticationError`] when no public or secret key can be resolved.
    pub fn new(options: ClientOptions) -> Result<Self> {
        Self::with_configuration(options, &Configuration::default())
    }

    /// Build a client purely from environment variables and defaults.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientOptions::default())
    }

    /// Build a client using `defaults` as the global configuration layer.
    pub fn with_configuration(options: ClientOptions, defaults: &Configuration) -> Result<Self> {
        Self::from_config(ClientConfig::resolve(&options, defaults)?)
    }

    /// Build a client from fully resolved settings, delivering over HTTP.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        let api = ApiClient::new(&config)?;
        let transport: Arc<dyn IngestionTransport> = Arc::new(api.clone());
        Ok(Self::assemble(config, api, transport))
    }

    /// Build a client that delivers batches through `transport` instead of the ingestion
    /// endpoint. Prompt calls still go to the configured host.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn IngestionTransport>) -> Result<Self> {
        let api = ApiClient::new(&config)?;
        Ok(Self::assemble(config, api, transport))
    }

    fn assemble(config: ClientConfig, api: ApiClient, transport: Arc<dyn IngestionTransport>) -> Self {
        let queue = Arc::new(EventQueue::new(config.debug));
        let delivery = Arc::new(Delivery::new(queue.clone(), transport, config.debug));

        let flusher = if config.auto_flush {
            BackgroundFlusher::start(delivery.clone(), config.flush_interval)
        } else {
            None
        };

        info!(
            host = %config.host,
            auto_flush = config.auto_flush,
            flush_interval_secs = config.flush_interval.as_secs_f64(),
            "Langfuse client initialized"
        );

        Self {
            inner: Arc::new(ClientInner {
                config,
                queue,
                delivery,
                api,
                flusher: Mutex::new(flusher),
                prompts: PromptCache::new(),
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn host(&self) -> &str {
        &self.inner.config.host
    }

    pub fn is_debug(&self) -> bool {
        self.inner.config.debug
    }

    /// Whether the periodic flush task is currently running.
    pub fn is_auto_flushing(&self) -> bool {
        self.inner
            .flusher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(BackgroundFlusher::is_running)
            .unwrap_or(false)
    }

    /// Start a trace. The `trace-create` event is enqueued before this returns.
    pub fn trace(&self, attrs: TraceAttributes) -> Trace {
        Trace::create(self.clone(), attrs)
    }

    /// Start a span in an existing trace.
    pub fn span(&self, trace_id: impl Into<String>, attrs: SpanAttributes) -> Result<Span> {
        Span::create(self.clone(), trace_id.into(), attrs)
    }

    /// Start a generation in an existing trace.
    pub fn generation(
        &self,
        trace_id: impl Into<String>,
        attrs: GenerationAttributes,
    ) -> Result<Generation> {
        Generation::create(self.clone(), trace_id.into(), attrs)
    }

    /// Record an event in an existing trace.
    pub fn event(&self, trace_id: impl Into<String>, attrs: EventAttributes) -> Result<Event> {
        Event::create(self.clone(), trace_id.into(), attrs)
    }

    fn typed_span(
        &self,
        trace_id: impl Into<String>,
        kind: ObservationType,
        mut attrs: SpanAttributes,
    ) -> Result<Span> {
        attrs.as_type = Some(kind.as_str().to_string());
        self.span(trace_id, attrs)
    }

    /// Start an agent span in an existing trace.
    pub fn agent(&self, trace_id: impl Into<String>, attrs: SpanAttributes) -> Result<Span> {
        self.typed_span(trace_id, ObservationType::Agent, attrs)
    }

    pub fn tool(&self, trace_id: impl Into<String>, attrs: SpanAttributes) -> Result<Span> {
        self.typed_span(trace_id, ObservationType::Tool, attrs)
    }

    pub fn chain(&self, trace_id: impl Into<String>, attrs: SpanAttributes) -> Result<Span> {
        self.typed_span(trace_id, ObservationType::Chain, attrs)
    }

    pub fn retriever(&self, trace_id: impl Into<String>, attrs: SpanAttributes) -> Result<Span> {
        self.typed_span(trace_id, ObservationType::Retriever, attrs)
    }

    /// Start an embedding span; `model` and `usage` are folded into its metadata.
    pub fn embedding(
        &self,
        trace_id: impl Into<String>,
        attrs: EmbeddingAttributes,
    ) -> Result<Span> {
        self.span(trace_id, attrs.into_span_attributes())
    }

    pub fn evaluator(&self, trace_id: impl Into<String>, attrs: SpanAttributes) -> Result<Span> {
        self.typed_span(trace_id, ObservationType::Evaluator, attrs)
    }

    pub fn guardrail(&self, trace_id: impl Into<String>, attrs: SpanAttributes) -> Result<Span> {
        self.typed_span(trace_id, ObservationType::Guardrail, attrs)
    }

    /// Enqueue a `score-create` event.
    pub fn score(&self, attrs: ScoreAttributes) {
        match to_body(&attrs, &attrs.extra) {
            Ok(mut body) => {
                if !body.contains_key("id") {
                    body.insert("id".to_string(), Value::String(generate_id()));
                }
                self.enqueue_kind(EventKind::ScoreCreate, body);
            }
            Err(e) => warn!(error = %e, "Failed to serialize score, skipping event"),
        }
    }

    /// Enqueue a raw event by its wire type name. Unknown types are logged and dropped.
    pub fn enqueue(&self, event_type: &str, body: Map<String, Value>) -> EnqueueOutcome {
        self.inner.queue.enqueue(event_type, body)
    }

    pub fn enqueue_kind(&self, kind: EventKind, body: Map<String, Value>) -> EnqueueOutcome {
        self.inner.queue.enqueue_kind(kind, body)
    }

    pub fn queue_len(&self) -> usize {
        self.inner.queue.len()
    }

    /// Copy of the events waiting for delivery.
    pub fn queued_events(&self) -> Vec<QueuedEvent> {
        self.inner.queue.snapshot()
    }

    /// Deliver everything queued as one batch.
    ///
    /// # Errors
    ///
    /// Returns the delivery error after putting the batch back into the queue.
    pub async fn flush(&self) -> Result<()> {
        self.inner.delivery.flush().await
    }

    /// Stop the background flusher, then make one final flush attempt if anything is still
    /// queued.
    ///
    /// The final flush's error is returned; ignore it for best-effort shutdown.
    pub async fn shutdown(&self) -> Result<()> {
        let flusher = self
            .inner
            .flusher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(flusher) = flusher {
            if let Err(e) = flusher.stop().await {
                warn!(error = %e, "Background flusher did not stop cleanly");
            }
        }

        if self.inner.queue.is_empty() {
            debug!("Shutdown with empty queue");
            return Ok(());
        }

        info!(pending = self.inner.queue.len(), "Flushing remaining events on shutdown");
        self.flush().await
    }

    /// Fetch a prompt, serving it from the in-process cache while younger than `cache_ttl`.
    pub async fn get_prompt(
        &self,
        name: &str,
        version: Option<u32>,
        label: Option<&str>,
        cache_ttl: Duration,
    ) -> Result<Prompt> {
        let key = PromptKey::new(name, version, label);
        if let Some(cached) = self.inner.prompts.get(&key, cache_ttl) {
            debug!(name, "Serving prompt from cache");
            return Ok(cached);
        }

        let fetched = prompt::fetch_prompt(&self.inner.api, name, version, label).await?;
        self.inner.prompts.insert(key, fetched.clone());
        Ok(fetched)
    }

    /// Create a new prompt (or a new version of an existing one).
    pub async fn create_prompt(&self, request: &CreatePromptRequest) -> Result<Prompt> {
        prompt::create_prompt(&self.inner.api, request).await
    }

    /// Drop every cached prompt.
    pub fn clear_prompt_cache(&self) {
        self.inner.prompts.clear();
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("host", &self.inner.config.host)
            .field("auto_flush", &self.inner.config.auto_flush)
            .field("queued", &self.inner.queue.len())
            .finish()
    }
}

impl Drop for ClientInner {
    fn drop(&mut self) {
        let pending = self.queue.len();
        if pending > 0 {
            warn!(pending, "Langfuse client dropped with undelivered events; call shutdown() first");
        }
    }
}

/// Whether `err` means the client could not be built for lack of credentials.
pub fn is_missing_credentials(err: &LangfuseError) -> bool {
    matches!(err, LangfuseError::AuthenticationError(_))
}
