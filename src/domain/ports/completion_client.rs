use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single completion request against the configured model.
///
/// Prompt compilation happens upstream; by the time a request reaches the
/// client it is a finished prompt string plus sampling parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The fully compiled prompt text.
    pub prompt: String,

    /// Maximum tokens to generate in the response.
    pub max_tokens: usize,

    /// Sampling temperature (0.0 to 2.0).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, max_tokens: usize) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens,
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Errors from the completion client.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl CompletionError {
    /// Map an HTTP status code to an error variant.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            400 => Self::InvalidRequest(message),
            401 | 403 => Self::AuthenticationError(message),
            429 => Self::RateLimitExceeded(message),
            s if s >= 500 => Self::ServerError { status: s, message },
            s => Self::ServerError { status: s, message },
        }
    }

    /// Transient errors are worth retrying; the rest fail fast.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimitExceeded(_)
                | Self::ServerError { .. }
                | Self::NetworkError(_)
                | Self::Timeout(_)
        )
    }
}

/// Port over the upstream completion service. One implementation talks to
/// the real HTTP API; tests substitute deterministic fakes.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Execute a completion and return the raw text of the model's reply.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status() {
        assert!(matches!(
            CompletionError::from_status(400, "bad".into()),
            CompletionError::InvalidRequest(_)
        ));
        assert!(matches!(
            CompletionError::from_status(401, "no".into()),
            CompletionError::AuthenticationError(_)
        ));
        assert!(matches!(
            CompletionError::from_status(429, "slow down".into()),
            CompletionError::RateLimitExceeded(_)
        ));
        assert!(matches!(
            CompletionError::from_status(503, "down".into()),
            CompletionError::ServerError { status: 503, .. }
        ));
    }

    #[test]
    fn test_transient_classification() {
        assert!(CompletionError::RateLimitExceeded("x".into()).is_transient());
        assert!(CompletionError::Timeout(30).is_transient());
        assert!(!CompletionError::InvalidRequest("x".into()).is_transient());
        assert!(!CompletionError::AuthenticationError("x".into()).is_transient());
    }
}
