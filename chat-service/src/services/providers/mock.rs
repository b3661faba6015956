//! Mock provider for local development and tests.

use super::{ChatProvider, ModelError};
use crate::models::{ChatTurn, Role};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Replies deterministically from the last visitor message.
pub struct MockChatProvider {
    failure: Option<ModelError>,
    latency: Duration,
    calls: AtomicUsize,
}

impl MockChatProvider {
    pub fn new() -> Self {
        Self {
            failure: None,
            latency: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    /// A provider whose every call fails with `error`.
    pub fn failing(error: ModelError) -> Self {
        Self {
            failure: Some(error),
            ..Self::new()
        }
    }

    /// Wait `latency` before every reply.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of `generate` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockChatProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatProvider for MockChatProvider {
    async fn generate(&self, history: &[ChatTurn]) -> Result<String, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        let question = history
            .iter()
            .rev()
            .find(|turn| turn.role == Role::User)
            .map(|turn| turn.content.as_str())
            .ok_or_else(|| ModelError::Api("history has no user turn".to_string()))?;

        Ok(format!("Mock response for: {}", question))
    }

    async fn health_check(&self) -> Result<(), ModelError> {
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock"
    }
}
