//! Error types and result aliases for the Langfuse SDK.
//!
//! This module defines the core error type [`LangfuseError`] and the [`Result`] type alias
//! used throughout the library. Construction-time credential problems, delivery failures
//! and validation failures all surface through this one enum so callers can match on the
//! category they care about.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LangfuseError {
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimitError(String),

    #[error("Timeout error: {0}")]
    TimeoutError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl LangfuseError {
    /// Whether the failure came from talking to the remote API rather than from local input.
    pub fn is_delivery_error(&self) -> bool {
        matches!(
            self,
            LangfuseError::RateLimitError(_)
                | LangfuseError::TimeoutError(_)
                | LangfuseError::NetworkError(_)
                | LangfuseError::ApiError(_)
                | LangfuseError::HttpError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, LangfuseError>;
