//! Client configuration and its resolution order.
//!
//! Every setting is resolved with the precedence
//! explicit [`ClientOptions`] > environment variable > [`Configuration`] > hardcoded default.
//! There is no process-wide mutable configuration: the global defaults are an ordinary
//! value handed to the client at construction.

use crate::error::{LangfuseError, Result};
use std::time::Duration;
use tracing::warn;

pub const ENV_PUBLIC_KEY: &str = "LANGFUSE_PUBLIC_KEY";
pub const ENV_SECRET_KEY: &str = "LANGFUSE_SECRET_KEY";
pub const ENV_HOST: &str = "LANGFUSE_HOST";
pub const ENV_DEBUG: &str = "LANGFUSE_DEBUG";
pub const ENV_AUTO_FLUSH: &str = "LANGFUSE_AUTO_FLUSH";
pub const ENV_FLUSH_INTERVAL: &str = "LANGFUSE_FLUSH_INTERVAL";

pub const DEFAULT_HOST: &str = "https://us.cloud.langfuse.com";

/// Global defaults shared by every client built from them.
#[derive(Debug, Clone)]
pub struct Configuration {
    pub public_key: Option<String>,
    pub secret_key: Option<String>,
    pub host: String,
    pub debug: bool,
    pub timeout: Duration,
    pub retries: u32,
    pub flush_interval: Duration,
    pub auto_flush: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            public_key: None,
            secret_key: None,
            host: DEFAULT_HOST.to_string(),
            debug: false,
            timeout: Duration::from_secs(30),
            retries: 3,
            flush_interval: Duration::from_secs(5),
            auto_flush: true,
        }
    }
}

/// Explicit per-client overrides. `None` means "fall through to the next source".
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    pub public_key: Option<String>,
    pub secret_key: Option<String>,
    pub host: Option<String>,
    pub debug: Option<bool>,
    pub timeout: Option<Duration>,
    pub retries: Option<u32>,
    pub flush_interval: Option<Duration>,
    pub auto_flush: Option<bool>,
}

impl ClientOptions {
    /// Options carrying only the two credentials.
    pub fn with_keys(public_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            public_key: Some(public_key.into()),
            secret_key: Some(secret_key.into()),
            ..Default::default()
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = Some(interval);
        self
    }

    pub fn auto_flush(mut self, auto_flush: bool) -> Self {
        self.auto_flush = Some(auto_flush);
        self
    }
}

/// Fully resolved settings a [`Client`](crate::Client) runs with.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub public_key: String,
    pub secret_key: String,
    pub host: String,
    pub debug: bool,
    pub timeout: Duration,
    pub retries: u32,
    pub flush_interval: Duration,
    pub auto_flush: bool,
}

impl ClientConfig {
    /// Resolve settings against the process environment.
    pub fn resolve(options: &ClientOptions, defaults: &Configuration) -> Result<Self> {
        Self::resolve_with(options, defaults, |key| std::env::var(key).ok())
    }

    /// Resolve settings using `env` as the environment lookup.
    ///
    /// Fails with [`LangfuseError::AuthenticationError`] when either key resolves to
    /// nothing or to an empty string.
    pub fn resolve_with<F>(options: &ClientOptions, defaults: &Configuration, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let public_key = options
            .public_key
            .clone()
            .or_else(|| env(ENV_PUBLIC_KEY))
            .or_else(|| defaults.public_key.clone())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| LangfuseError::AuthenticationError("Public key is required".to_string()))?;

        let secret_key = options
            .secret_key
            .clone()
            .or_else(|| env(ENV_SECRET_KEY))
            .or_else(|| defaults.secret_key.clone())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| LangfuseError::AuthenticationError("Secret key is required".to_string()))?;

        let host = options
            .host
            .clone()
            .or_else(|| env(ENV_HOST).filter(|h| !h.is_empty()))
            .unwrap_or_else(|| defaults.host.clone());

        let debug = options
            .debug
            .or_else(|| parse_bool(ENV_DEBUG, env(ENV_DEBUG)))
            .unwrap_or(defaults.debug);

        let auto_flush = options
            .auto_flush
            .or_else(|| parse_bool(ENV_AUTO_FLUSH, env(ENV_AUTO_FLUSH)))
            .unwrap_or(defaults.auto_flush);

        let flush_interval = options
            .flush_interval
            .or_else(|| parse_seconds(ENV_FLUSH_INTERVAL, env(ENV_FLUSH_INTERVAL)))
            .unwrap_or(defaults.flush_interval);

        if flush_interval.is_zero() {
            return Err(LangfuseError::ConfigError(
                "flush interval must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            public_key,
            secret_key,
            host: host.trim_end_matches('/').to_string(),
            debug,
            timeout: options.timeout.unwrap_or(defaults.timeout),
            retries: options.retries.unwrap_or(defaults.retries),
            flush_interval,
            auto_flush,
        })
    }
}

fn parse_bool(key: &str, raw: Option<String>) -> Option<bool> {
    let raw = raw?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        "" => None,
        _ => {
            warn!(key, value = %raw, "Ignoring unparseable boolean environment variable");
            None
        }
    }
}

fn parse_seconds(key: &str, raw: Option<String>) -> Option<Duration> {
    let raw = raw?;
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
        _ => {
            warn!(key, value = %raw, "Ignoring invalid flush interval in environment");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Configuration::default();

        assert_eq!(config.host, "https://us.cloud.langfuse.com");
        assert!(!config.debug);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.retries, 3);
        assert_eq!(config.flush_interval, Duration::from_secs(5));
        assert!(config.auto_flush);
    }

    #[test]
    fn test_explicit_options_win() {
        let options = ClientOptions::with_keys("pk", "sk")
            .host("https://explicit.example.com")
            .auto_flush(false)
            .flush_interval(Duration::from_secs(1));
        let env = env_from(&[
            (ENV_PUBLIC_KEY, "pk-env"),
            (ENV_HOST, "https://env.example.com"),
            (ENV_AUTO_FLUSH, "true"),
            (ENV_FLUSH_INTERVAL, "9"),
        ]);

        let config = ClientConfig::resolve_with(&options, &Configuration::default(), env).unwrap();

        assert_eq!(config.public_key, "pk");
        assert_eq!(config.host, "https://explicit.example.com");
        assert!(!config.auto_flush);
        assert_eq!(config.flush_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_environment_beats_global_defaults() {
        let defaults = Configuration {
            public_key: Some("pk-global".to_string()),
            secret_key: Some("sk-global".to_string()),
            host: "https://global.example.com".to_string(),
            ..Default::default()
        };
        let env = env_from(&[
            (ENV_PUBLIC_KEY, "pk-env"),
            (ENV_HOST, "https://env.example.com/"),
            (ENV_DEBUG, "true"),
            (ENV_AUTO_FLUSH, "false"),
            (ENV_FLUSH_INTERVAL, "12"),
        ]);

        let config = ClientConfig::resolve_with(&ClientOptions::default(), &defaults, env).unwrap();

        assert_eq!(config.public_key, "pk-env");
        assert_eq!(config.secret_key, "sk-global");
        assert_eq!(config.host, "https://env.example.com");
        assert!(config.debug);
        assert!(!config.auto_flush);
        assert_eq!(config.flush_interval, Duration::from_secs(12));
    }

    #[test]
    fn test_invalid_environment_values_fall_through() {
        let defaults = Configuration {
            public_key: Some("pk".to_string()),
            secret_key: Some("sk".to_string()),
            ..Default::default()
        };
        let env = env_from(&[(ENV_AUTO_FLUSH, "maybe"), (ENV_FLUSH_INTERVAL, "soon")]);

        let config = ClientConfig::resolve_with(&ClientOptions::default(), &defaults, env).unwrap();

        assert!(config.auto_flush);
        assert_eq!(config.flush_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_missing_public_key() {
        let options = ClientOptions {
            secret_key: Some("sk".to_string()),
            ..Default::default()
        };

        let err = ClientConfig::resolve_with(&options, &Configuration::default(), |_| None)
            .unwrap_err();

        match err {
            LangfuseError::AuthenticationError(msg) => assert_eq!(msg, "Public key is required"),
            other => panic!("Expected AuthenticationError, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_secret_key_is_rejected() {
        let options = ClientOptions::with_keys("pk", "");

        let err = ClientConfig::resolve_with(&options, &Configuration::default(), |_| None)
            .unwrap_err();

        match err {
            LangfuseError::AuthenticationError(msg) => assert_eq!(msg, "Secret key is required"),
            other => panic!("Expected AuthenticationError, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_flush_interval_is_rejected() {
        let options = ClientOptions::with_keys("pk", "sk").flush_interval(Duration::ZERO);

        let result = ClientConfig::resolve_with(&options, &Configuration::default(), |_| None);

        assert!(matches!(result, Err(LangfuseError::ConfigError(_))));
    }
}
