//! Built-in bus consumers.

use super::bus::{ConsumerError, EventConsumer};
use super::sink::RecordSink;
use crate::models::{ChatTurn, ConversationRecord, PortalEvent};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// Keeps the visible transcript of every session.
///
/// Failed turns show up here as the visitor message followed by the apology,
/// even though the model history does not keep them.
#[derive(Default)]
pub struct TranscriptConsumer {
    transcripts: DashMap<String, Vec<ChatTurn>>,
}

impl TranscriptConsumer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transcript for `session_id`, oldest turn first.
    pub fn transcript(&self, session_id: &str) -> Vec<ChatTurn> {
        self.transcripts
            .get(session_id)
            .map(|turns| turns.value().clone())
            .unwrap_or_default()
    }

    fn append(&self, session_id: &str, turns: [&ChatTurn; 2]) {
        self.transcripts
            .entry(session_id.to_string())
            .or_default()
            .extend(turns.into_iter().cloned());
    }
}

#[async_trait]
impl EventConsumer for TranscriptConsumer {
    fn name(&self) -> &'static str {
        "transcript"
    }

    async fn handle(&self, event: &PortalEvent) -> Result<(), ConsumerError> {
        match event {
            PortalEvent::TurnCompleted {
                session_id,
                user,
                assistant,
            } => self.append(session_id, [user, assistant]),
            PortalEvent::TurnFailed {
                session_id,
                user,
                apology,
            } => self.append(session_id, [user, apology]),
            PortalEvent::TranscriptCleared { session_id }
            | PortalEvent::SessionEnded { session_id } => {
                self.transcripts.remove(session_id);
            }
            PortalEvent::ContactSubmitted(_) => {}
        }
        Ok(())
    }
}

/// Mirrors completed exchanges and contact submissions into the record sink.
pub struct PersistenceConsumer {
    sink: Arc<dyn RecordSink>,
}

impl PersistenceConsumer {
    pub fn new(sink: Arc<dyn RecordSink>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl EventConsumer for PersistenceConsumer {
    fn name(&self) -> &'static str {
        "persistence"
    }

    async fn handle(&self, event: &PortalEvent) -> Result<(), ConsumerError> {
        let record = match event {
            PortalEvent::TurnCompleted {
                session_id,
                user,
                assistant,
            } => ConversationRecord::chat_turn(
                session_id.as_str(),
                user.content.as_str(),
                assistant.content.as_str(),
            ),
            PortalEvent::ContactSubmitted(submission) => {
                ConversationRecord::contact_form(submission)
            }
            // Apologies are not conversation content.
            PortalEvent::TurnFailed { .. }
            | PortalEvent::TranscriptCleared { .. }
            | PortalEvent::SessionEnded { .. } => return Ok(()),
        };

        let id = self.sink.save(&record).await?;
        tracing::debug!(
            record_id = %id,
            kind = %record.kind,
            sink = self.sink.name(),
            "Conversation record persisted"
        );
        Ok(())
    }
}
