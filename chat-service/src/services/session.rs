//! One visitor's dialogue with the hosted model.

use super::metrics;
use super::prompt::seed_pair;
use super::providers::{ChatProvider, ModelError};
use crate::models::{ChatTurn, Role};
use std::sync::Arc;
use std::time::Instant;

/// Dialogue history plus the provider it is replayed to.
///
/// History always starts with the seed pair and then alternates user and
/// assistant turns.
pub struct ModelSession {
    provider: Arc<dyn ChatProvider>,
    history: Vec<ChatTurn>,
}

impl ModelSession {
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self {
            provider,
            history: seed_pair().to_vec(),
        }
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    /// The most recent visitor message and the reply to it.
    pub fn last_exchange(&self) -> Option<(&ChatTurn, &ChatTurn)> {
        match self.history.as_slice() {
            [.., user, assistant]
                if self.history.len() > 2
                    && user.role == Role::User
                    && assistant.role == Role::Assistant =>
            {
                Some((user, assistant))
            }
            _ => None,
        }
    }

    /// Forward `text` with the accumulated history and return the reply.
    ///
    /// `text` must be non-empty; callers validate it. On failure the visitor
    /// turn is dropped again, so a retry does not send it twice.
    pub async fn send(&mut self, text: &str) -> Result<String, ModelError> {
        self.discard_pending();
        self.history.push(ChatTurn::user(text));

        let started = Instant::now();
        let result = self.provider.generate(&self.history).await;
        metrics::record_model_latency(
            self.provider.name(),
            self.provider.model(),
            started.elapsed().as_secs_f64(),
        );

        let result = result.and_then(|reply| {
            if reply.trim().is_empty() {
                Err(ModelError::EmptyReply)
            } else {
                Ok(reply)
            }
        });

        let reply = match result {
            Ok(reply) => reply,
            Err(e) => {
                self.discard_pending();
                return Err(e);
            }
        };

        self.history.push(ChatTurn::assistant(reply.clone()));
        Ok(reply)
    }

    /// Throw away everything but the seed pair.
    pub fn reset(&mut self) {
        self.history.clear();
        self.history.extend(seed_pair());
    }

    // A cancelled send can leave its visitor turn behind.
    fn discard_pending(&mut self) {
        if self.history.len() > 2
            && self.history.last().map(|turn| turn.role) == Some(Role::User)
        {
            self.history.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::prompt::{PREAMBLE_ACKNOWLEDGMENT, SYSTEM_PREAMBLE};
    use crate::services::providers::MockChatProvider;

    fn session() -> ModelSession {
        ModelSession::new(Arc::new(MockChatProvider::new()))
    }

    fn assert_seeded(session: &ModelSession) {
        let history = session.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::System);
        assert_eq!(history[0].content.as_bytes(), SYSTEM_PREAMBLE.as_bytes());
        assert_eq!(history[1].role, Role::Assistant);
        assert_eq!(
            history[1].content.as_bytes(),
            PREAMBLE_ACKNOWLEDGMENT.as_bytes()
        );
    }

    #[tokio::test]
    async fn starts_from_seed_pair() {
        assert_seeded(&session());
    }

    #[tokio::test]
    async fn two_sends_grow_history_by_four() {
        let mut session = session();

        let first = session.send("What programs are offered at CIC?").await.unwrap();
        let second = session.send("How can I apply to CIC?").await.unwrap();

        assert!(!first.is_empty());
        assert!(!second.is_empty());
        assert_eq!(session.history().len(), 2 + 4);

        let roles: Vec<Role> = session.history()[2..].iter().map(|t| t.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
        );
    }

    #[tokio::test]
    async fn reset_restores_exact_seed_pair() {
        let mut session = session();
        for i in 0..5 {
            session.send(&format!("question {}", i)).await.unwrap();
        }
        assert_eq!(session.history().len(), 12);

        session.reset();
        assert_seeded(&session);
        assert!(session.last_exchange().is_none());
    }

    #[tokio::test]
    async fn failed_send_leaves_history_untouched() {
        let mut session = ModelSession::new(Arc::new(MockChatProvider::failing(
            ModelError::Network("connection refused".to_string()),
        )));

        let err = session.send("hello").await.unwrap_err();
        assert_eq!(err, ModelError::Network("connection refused".to_string()));
        assert_seeded(&session);
    }

    #[tokio::test]
    async fn last_exchange_pairs_question_and_reply() {
        let mut session = session();
        session.send("Tell me about the New Cairo campus.").await.unwrap();

        let (user, assistant) = session.last_exchange().unwrap();
        assert_eq!(user.content, "Tell me about the New Cairo campus.");
        assert_eq!(
            assistant.content,
            "Mock response for: Tell me about the New Cairo campus."
        );
    }

    #[tokio::test]
    async fn dangling_user_turn_is_discarded_before_next_send() {
        let mut session = session();
        session.history.push(ChatTurn::user("abandoned"));

        session.send("fresh").await.unwrap();

        let contents: Vec<&str> = session.history()[2..]
            .iter()
            .map(|t| t.content.as_str())
            .collect();
        assert_eq!(contents, vec!["fresh", "Mock response for: fresh"]);
    }
}
