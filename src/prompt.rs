//! Prompt management: retrieval with an in-process TTL cache, creation, and template
//! compilation.
//!
//! Templates support both `{{variable}}` and `{variable}` placeholders.

use crate::api::{looks_like_html, ApiClient};
use crate::error::{LangfuseError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub const PROMPTS_PATH: &str = "/api/public/v2/prompts";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Prompt body: a single template string or a list of chat messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PromptContent {
    Text(String),
    Chat(Vec<ChatMessage>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptType {
    Text,
    Chat,
}

/// Result of [`Prompt::compile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompiledPrompt {
    Text(String),
    Chat(Vec<ChatMessage>),
}

impl CompiledPrompt {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CompiledPrompt::Text(text) => Some(text),
            CompiledPrompt::Chat(_) => None,
        }
    }

    pub fn as_messages(&self) -> Option<&[ChatMessage]> {
        match self {
            CompiledPrompt::Chat(messages) => Some(messages),
            CompiledPrompt::Text(_) => None,
        }
    }
}

/// A versioned prompt as stored by Langfuse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub version: Option<u32>,
    pub prompt: PromptContent,
    #[serde(default)]
    pub config: Map<String, Value>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(rename = "type", default)]
    pub prompt_type: Option<PromptType>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Prompt {
    /// Declared type, falling back to the shape of the content.
    pub fn kind(&self) -> PromptType {
        self.prompt_type.unwrap_or(match self.prompt {
            PromptContent::Text(_) => PromptType::Text,
            PromptContent::Chat(_) => PromptType::Chat,
        })
    }

    /// Substitute `variables` into the template.
    ///
    /// Placeholders without a matching variable are left as they are.
    pub fn compile<I, K, V>(&self, variables: I) -> CompiledPrompt
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: ToString,
    {
        let variables: Vec<(String, String)> = variables
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_string(), v.to_string()))
            .collect();

        match &self.prompt {
            PromptContent::Text(text) => CompiledPrompt::Text(substitute(text, &variables)),
            PromptContent::Chat(messages) => CompiledPrompt::Chat(
                messages
                    .iter()
                    .map(|m| ChatMessage::new(m.role.clone(), substitute(&m.content, &variables)))
                    .collect(),
            ),
        }
    }

    /// Placeholder names in order of first appearance, without duplicates.
    pub fn variables(&self) -> Vec<String> {
        match &self.prompt {
            PromptContent::Text(text) => extract_variables(text),
            PromptContent::Chat(messages) => {
                let mut names: Vec<String> = Vec::new();
                for message in messages {
                    for name in extract_variables(&message.content) {
                        if !names.contains(&name) {
                            names.push(name);
                        }
                    }
                }
                names
            }
        }
    }

    /// LangChain-style template description of this prompt.
    pub fn to_langchain(&self) -> Value {
        match &self.prompt {
            PromptContent::Text(text) => json!({
                "_type": "prompt",
                "input_variables": extract_variables(text),
                "template": text,
            }),
            PromptContent::Chat(messages) => {
                let converted: Vec<Value> = messages
                    .iter()
                    .map(|m| {
                        json!({
                            "_type": format!("{}_message", m.role),
                            "content": m.content,
                            "input_variables": extract_variables(&m.content),
                        })
                    })
                    .collect();
                json!({
                    "_type": "chat",
                    "messages": converted,
                    "input_variables": self.variables(),
                })
            }
        }
    }
}

fn substitute(template: &str, variables: &[(String, String)]) -> String {
    let mut compiled = template.to_string();
    for (key, value) in variables {
        compiled = compiled.replace(&format!("{{{{{}}}}}", key), value);
        compiled = compiled.replace(&format!("{{{}}}", key), value);
    }
    compiled
}

fn placeholder_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\{\{(\w+)\}\}|\{(\w+)\}").ok())
        .as_ref()
}

/// Placeholder names in `text` (`{{var}}` or `{var}`), in order of first appearance.
pub fn extract_variables(text: &str) -> Vec<String> {
    let Some(pattern) = placeholder_pattern() else {
        return Vec::new();
    };
    let mut names: Vec<String> = Vec::new();
    for captures in pattern.captures_iter(text) {
        let Some(name) = captures.get(1).or_else(|| captures.get(2)) else {
            continue;
        };
        if !names.iter().any(|n| n == name.as_str()) {
            names.push(name.as_str().to_string());
        }
    }
    names
}

/// Body for creating a prompt.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePromptRequest {
    pub name: String,
    pub prompt: PromptContent,
    pub labels: Vec<String>,
    pub config: Map<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(rename = "type")]
    pub prompt_type: PromptType,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CreatePromptRequest {
    pub fn text(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self::with_content(name, PromptContent::Text(template.into()), PromptType::Text)
    }

    pub fn chat(name: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self::with_content(name, PromptContent::Chat(messages), PromptType::Chat)
    }

    fn with_content(name: impl Into<String>, prompt: PromptContent, prompt_type: PromptType) -> Self {
        Self {
            name: name.into(),
            prompt,
            labels: Vec::new(),
            config: Map::new(),
            tags: Vec::new(),
            prompt_type,
            extra: Map::new(),
        }
    }

    pub fn labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn config(mut self, config: Value) -> Self {
        self.config = crate::observation::to_map(config);
        self
    }
}

/// Cache key: prompt name plus the requested version and label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PromptKey {
    name: String,
    version: Option<u32>,
    label: Option<String>,
}

impl PromptKey {
    pub fn new(name: &str, version: Option<u32>, label: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            version,
            label: label.map(str::to_string),
        }
    }
}

struct CachedPrompt {
    prompt: Prompt,
    cached_at: Instant,
}

/// Thread-safe prompt cache with a per-lookup TTL.
#[derive(Default)]
pub struct PromptCache {
    entries: Mutex<HashMap<PromptKey, CachedPrompt>>,
}

impl PromptCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached prompt for `key` if it was stored less than `ttl` ago.
    pub fn get(&self, key: &PromptKey, ttl: Duration) -> Option<Prompt> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(key)
            .filter(|entry| entry.cached_at.elapsed() < ttl)
            .map(|entry| entry.prompt.clone())
    }

    pub fn insert(&self, key: PromptKey, prompt: Prompt) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                key,
                CachedPrompt {
                    prompt,
                    cached_at: Instant::now(),
                },
            );
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn parse_prompt(body: &str) -> Result<Prompt> {
    if looks_like_html(body) {
        return Err(LangfuseError::ApiError(
            "Received HTML response instead of JSON. This usually indicates a 404 error or \
             incorrect API endpoint."
                .to_string(),
        ));
    }
    serde_json::from_str(body)
        .map_err(|e| LangfuseError::ValidationError(format!("Malformed prompt response: {}", e)))
}

/// `GET /api/public/v2/prompts/{name}` with optional `version` and `label`.
pub(crate) async fn fetch_prompt(
    api: &ApiClient,
    name: &str,
    version: Option<u32>,
    label: Option<&str>,
) -> Result<Prompt> {
    let path = format!("{}/{}", PROMPTS_PATH, urlencoding::encode(name));
    let mut query: Vec<(&str, String)> = Vec::new();
    if let Some(version) = version {
        query.push(("version", version.to_string()));
    }
    if let Some(label) = label {
        query.push(("label", label.to_string()));
    }

    debug!(path = %path, ?query, "Fetching prompt");
    let body = api.get(&path, &query).await?;
    let prompt = parse_prompt(&body)?;
    info!(name = %prompt.name, version = ?prompt.version, "Fetched prompt");
    Ok(prompt)
}

pub(crate) async fn create_prompt(api: &ApiClient, request: &CreatePromptRequest) -> Result<Prompt> {
    let body = api.post(PROMPTS_PATH, request).await?;
    parse_prompt(&body)
}
