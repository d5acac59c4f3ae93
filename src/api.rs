//! HTTP client for the Langfuse public API.
//!
//! Wraps a `reqwest::Client` configured with Basic auth built from the key pair, the SDK
//! `User-Agent` and the configured request timeout. Responses are mapped onto the
//! [`LangfuseError`] taxonomy; connection failures are retried with exponential backoff
//! before surfacing as [`LangfuseError::NetworkError`].

use crate::config::ClientConfig;
use crate::error::{LangfuseError, Result};
use crate::ingestion::transport::{
    IngestionBatch, IngestionResponse, IngestionTransport, SDK_NAME, SDK_VERSION,
};
use async_trait::async_trait;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const INGESTION_PATH: &str = "/api/public/ingestion";

/// Upper bound on the wait between connection retries.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Authenticated client for the Langfuse REST API.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    host: String,
    retries: u32,
    debug: bool,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let credentials = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", config.public_key, config.secret_key));
        let auth = HeaderValue::from_str(&format!("Basic {}", credentials)).map_err(|e| {
            LangfuseError::ConfigError(format!("Invalid characters in credentials: {}", e))
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(format!("{}/{}", SDK_NAME, SDK_VERSION))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            host: config.host.clone(),
            retries: config.retries,
            debug: config.debug,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.host, path)
    }

    /// `GET {host}{path}` with query parameters; returns the raw body text.
    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<String> {
        let url = self.url(path);
        if self.debug {
            info!(url = %url, ?query, "GET request");
        }
        self.execute(|| self.client.get(&url).query(query)).await
    }

    /// `POST {host}{path}` with a JSON body; returns the raw body text.
    pub async fn post<T: Serialize + ?Sized + Sync>(&self, path: &str, body: &T) -> Result<String> {
        let url = self.url(path);
        if self.debug {
            info!(url = %url, "POST request");
        }
        self.execute(|| self.client.post(&url).json(body)).await
    }

    async fn execute<F>(&self, build: F) -> Result<String>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt: u32 = 0;

        loop {
            match build().send().await {
                Ok(response) => return handle_response(response).await,
                Err(e) if e.is_timeout() => {
                    return Err(LangfuseError::TimeoutError(format!("Request timed out: {}", e)));
                }
                Err(e) if e.is_connect() => {
                    if attempt < self.retries {
                        attempt += 1;
                        let delay = retry_delay(attempt);
                        warn!(attempt, delay_secs = delay.as_secs(), "Connection failed, retrying: {}", e);
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(LangfuseError::NetworkError(format!("Connection failed: {}", e)));
                }
                Err(e) => {
                    return Err(LangfuseError::ApiError(format!("Request failed: {}", e)));
                }
            }
        }
    }
}

/// Exponential backoff, `2^attempt` seconds, capped at [`MAX_RETRY_DELAY`].
fn retry_delay(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt)).min(MAX_RETRY_DELAY)
}

/// Parse a response body as JSON; an empty body parses as `null`.
pub fn parse_json(body: &str) -> Result<Value> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(body)?)
}

pub(crate) fn looks_like_html(body: &str) -> bool {
    let head = body.trim_start();
    head.starts_with("<!DOCTYPE html") || head.starts_with("<!doctype html") || head.starts_with("<html")
}

async fn handle_response(response: Response) -> Result<String> {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    debug!(status = status.as_u16(), "Handling response");

    if status.is_success() {
        return Ok(body);
    }

    let code = status.as_u16();
    let err = match status {
        StatusCode::UNAUTHORIZED => {
            LangfuseError::AuthenticationError(format!("Authentication failed: {}", body))
        }
        StatusCode::NOT_FOUND => {
            let detail = if looks_like_html(&body) {
                ". Server returned HTML page instead of JSON API response. \
                 This usually means the requested resource does not exist."
                    .to_string()
            } else {
                format!(": {}", body)
            };
            LangfuseError::ValidationError(format!("Resource not found (404){}", detail))
        }
        StatusCode::TOO_MANY_REQUESTS => LangfuseError::RateLimitError(body),
        s if s.is_client_error() => {
            if body.contains("invalid_union") || body.contains("discriminator") {
                LangfuseError::ValidationError(format!(
                    "Event type validation failed ({}): The event type or structure is invalid. \
                     Please check the event format.\nError details: {}",
                    code, body
                ))
            } else {
                LangfuseError::ValidationError(format!("Client error ({}): {}", code, body))
            }
        }
        s if s.is_server_error() => {
            LangfuseError::ApiError(format!("Server error ({}): {}", code, body))
        }
        _ => LangfuseError::ApiError(format!("Unexpected response ({}): {}", code, body)),
    };

    Err(err)
}

#[async_trait]
impl IngestionTransport for ApiClient {
    async fn send_batch(&self, batch: &IngestionBatch<'_>) -> Result<IngestionResponse> {
        let body = self.post(INGESTION_PATH, batch).await?;
        let response = match parse_json(&body) {
            Ok(Value::Null) | Err(_) => IngestionResponse::default(),
            Ok(value) => serde_json::from_value(value).unwrap_or_default(),
        };
        for failure in &response.errors {
            debug!(
                event_id = %failure.id,
                status = failure.status,
                message = failure.message.as_deref().unwrap_or(""),
                "Event rejected by ingestion endpoint"
            );
        }
        Ok(response)
    }
}
