//! Anthropic adapter: Implementation of TextCompletion over the Messages API.
//!
//! Each call is a single blocking round-trip bounded by the client timeout.
//! There are no retries; callers fall back to the next tier on any error.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ports::{CompletionError, CompletionOptions, TextCompletion};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-3-haiku-20240307";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
const API_VERSION: &str = "2023-06-01";

/// Client settings.
#[derive(Clone)]
pub struct AnthropicConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

// The key must never reach a log line.
impl std::fmt::Debug for AnthropicConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl AnthropicConfig {
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Request body for /v1/messages
#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

/// Response body from /v1/messages
#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Extract the first text block from a Messages API response.
fn first_text(response: MessagesResponse) -> Result<String, CompletionError> {
    response
        .content
        .into_iter()
        .find(|block| block.kind == "text")
        .and_then(|block| block.text)
        .ok_or_else(|| CompletionError::MalformedResponse("no text content block".into()))
}

/// HTTP client for the Anthropic Messages API.
pub struct AnthropicClient {
    config: AnthropicConfig,
    client: reqwest::blocking::Client,
}

impl AnthropicClient {
    /// Build a client with the configured timeout.
    ///
    /// # Errors
    /// Returns `CompletionError::NotConfigured` for an empty key, or
    /// `CompletionError::Http` if the HTTP client cannot be built.
    pub fn new(config: AnthropicConfig) -> Result<Self, CompletionError> {
        if config.api_key.trim().is_empty() {
            return Err(CompletionError::NotConfigured);
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CompletionError::Http(e.to_string()))?;

        tracing::info!(model = %config.model, "Initialized reasoning provider client");
        Ok(Self {
            config: AnthropicConfig {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                ..config
            },
            client,
        })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Minimal, cheap call used once at startup to decide availability.
    ///
    /// # Errors
    /// Returns the underlying `CompletionError` (commonly a billing or auth
    /// status) when the provider is not usable.
    pub fn probe(&self) -> Result<(), CompletionError> {
        self.complete("Hello", &CompletionOptions::with_max_tokens(5))
            .map(|_| ())
    }
}

impl TextCompletion for AnthropicClient {
    fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, CompletionError> {
        let url = format!("{}/v1/messages", self.config.base_url);
        let body = MessagesRequest {
            model: &self.config.model,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    CompletionError::Connection(self.config.base_url.clone())
                } else if e.is_timeout() {
                    CompletionError::Timeout(self.config.timeout_secs)
                } else {
                    CompletionError::Http(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: MessagesResponse = response
            .json()
            .map_err(|e| CompletionError::MalformedResponse(e.to_string()))?;

        first_text(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_key_not_configured() {
        let err = AnthropicClient::new(AnthropicConfig::new("  ")).err();
        assert!(matches!(err, Some(CompletionError::NotConfigured)));
    }

    #[test]
    fn test_debug_redacts_key() {
        let cfg = AnthropicConfig::new("sk-ant-secret-value");
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("sk-ant-secret-value"));
        assert!(dbg.contains("[REDACTED]"));
    }

    #[test]
    fn test_request_body_shape() {
        let body = MessagesRequest {
            model: DEFAULT_MODEL,
            max_tokens: 500,
            temperature: None,
            messages: [Message {
                role: "user",
                content: "hi",
            }],
        };
        let json = serde_json::to_value(&body).expect("serialize");
        assert_eq!(json["max_tokens"], 500);
        assert_eq!(json["messages"][0]["role"], "user");
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn test_first_text_block_extracted() {
        let parsed: MessagesResponse = serde_json::from_str(
            r#"{"content":[{"type":"tool_use","id":"x"},{"type":"text","text":"hello"}]}"#,
        )
        .expect("parse");
        assert_eq!(first_text(parsed).expect("text"), "hello");
    }

    #[test]
    fn test_missing_text_block_is_malformed() {
        let parsed: MessagesResponse =
            serde_json::from_str(r#"{"content":[]}"#).expect("parse");
        assert!(matches!(
            first_text(parsed),
            Err(CompletionError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_unreachable_provider_fails_fast() {
        let mut cfg = AnthropicConfig::new("sk-ant-test");
        // Port 9 (discard) on localhost is closed in CI sandboxes.
        cfg.base_url = "http://127.0.0.1:9".to_string();
        cfg.timeout_secs = 2;
        let client = AnthropicClient::new(cfg).expect("client");
        assert!(client
            .complete("ping", &CompletionOptions::with_max_tokens(5))
            .is_err());
    }
}
