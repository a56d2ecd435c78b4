//! Text completion port: Trait for the remote reasoning provider.
//!
//! The provider is unreliable and rate/billing limited. Callers make a single
//! attempt and fall back on any error.

/// Errors raised by a text completion provider.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CompletionError {
    #[error("Reasoning provider not configured")]
    NotConfigured,

    #[error("Cannot reach reasoning provider at {0}")]
    Connection(String),

    #[error("Reasoning provider request timed out after {0}s")]
    Timeout(u64),

    #[error("Reasoning provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed reasoning provider response: {0}")]
    MalformedResponse(String),

    #[error("HTTP client error: {0}")]
    Http(String),
}

/// Per-call generation settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    pub max_tokens: u32,
    pub temperature: Option<f32>,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            max_tokens: 600,
            temperature: None,
        }
    }
}

impl CompletionOptions {
    #[must_use]
    pub fn with_max_tokens(max_tokens: u32) -> Self {
        Self {
            max_tokens,
            temperature: None,
        }
    }

    #[must_use]
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Remote text-completion capability.
pub trait TextCompletion: Send + Sync {
    /// Complete a single-turn prompt.
    ///
    /// # Errors
    /// Returns `CompletionError` on network failure, non-success status or
    /// an unparseable response body.
    fn complete(&self, prompt: &str, options: &CompletionOptions)
        -> Result<String, CompletionError>;
}
