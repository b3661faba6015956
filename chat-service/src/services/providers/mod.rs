//! Hosted model providers.
//!
//! The chat flow only needs one capability from a provider: given the full
//! dialogue history, produce the next assistant reply. Gemini is the
//! production backend; the mock backs local development and tests.

pub mod gemini;
pub mod mock;

use crate::models::ChatTurn;
use async_trait::async_trait;
use thiserror::Error;

pub use gemini::{GeminiChatProvider, GeminiConfig};
pub use mock::MockChatProvider;

/// Failure talking to the remote model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Model provider not configured: {0}")]
    NotConfigured(String),

    #[error("Model API error: {0}")]
    Api(String),

    #[error("Model API rejected the credentials: {0}")]
    Auth(String),

    #[error("Model API quota exceeded")]
    RateLimited,

    #[error("Reply blocked by the model's safety filters")]
    ContentFiltered,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Model request timed out")]
    Timeout,

    #[error("Model returned an empty reply")]
    EmptyReply,

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),
}

impl ModelError {
    /// Metric label for the error family.
    pub fn kind(&self) -> &'static str {
        match self {
            ModelError::NotConfigured(_) => "not_configured",
            ModelError::Api(_) => "api",
            ModelError::Auth(_) => "auth",
            ModelError::RateLimited => "rate_limited",
            ModelError::ContentFiltered => "content_filtered",
            ModelError::Network(_) => "network",
            ModelError::Timeout => "timeout",
            ModelError::EmptyReply => "empty_reply",
            ModelError::MalformedResponse(_) => "malformed_response",
        }
    }
}

/// Sampling settings sent with every request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.95,
            top_k: 64,
        }
    }
}

#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Produce the next assistant reply for `history`, whose last entry is
    /// the visitor's new message.
    async fn generate(&self, history: &[ChatTurn]) -> Result<String, ModelError>;

    /// Verify the backend is reachable and the credentials work.
    async fn health_check(&self) -> Result<(), ModelError>;

    /// Backend name for logs and metrics.
    fn name(&self) -> &'static str;

    /// Model identifier for logs and metrics.
    fn model(&self) -> &str;
}
