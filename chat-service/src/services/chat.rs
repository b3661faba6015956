//! The chat flow: resolve the visitor's session, ask the model, fan out.

use super::bus::{NotificationBus, PublishReport};
use super::consumers::{PersistenceConsumer, TranscriptConsumer};
use super::metrics;
use super::prompt;
use super::providers::ChatProvider;
use super::registry::SessionRegistry;
use super::shaping::{classify, Reply, ShapingPipeline};
use super::sink::RecordSink;
use crate::models::{ChatTurn, ContactSubmission, PortalEvent};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ChatOptions {
    pub session_ttl: Duration,
    pub shape_replies: bool,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            session_ttl: Duration::from_secs(30 * 60),
            shape_replies: false,
        }
    }
}

/// What the visitor gets back for one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatOutcome {
    /// The model reply, or an apology when the model call failed.
    pub reply: String,
    pub error: bool,
    /// Consumer failures worth surfacing, such as a record that was not saved.
    pub warnings: Vec<String>,
}

pub struct ChatService {
    provider: Arc<dyn ChatProvider>,
    registry: SessionRegistry,
    bus: NotificationBus,
    transcripts: Arc<TranscriptConsumer>,
    shaping: Option<ShapingPipeline>,
}

impl ChatService {
    /// Wire the registry and bus, with the transcript consumer subscribed
    /// ahead of persistence.
    pub fn new(
        provider: Arc<dyn ChatProvider>,
        sink: Arc<dyn RecordSink>,
        options: ChatOptions,
    ) -> Self {
        let bus = NotificationBus::new();
        let transcripts = Arc::new(TranscriptConsumer::new());
        bus.subscribe(transcripts.clone());
        bus.subscribe(Arc::new(PersistenceConsumer::new(sink)));

        Self {
            registry: SessionRegistry::new(provider.clone(), options.session_ttl),
            provider,
            bus,
            transcripts,
            shaping: options.shape_replies.then(ShapingPipeline::live),
        }
    }

    pub fn bus(&self) -> &NotificationBus {
        &self.bus
    }

    pub fn provider(&self) -> &Arc<dyn ChatProvider> {
        &self.provider
    }

    pub fn active_sessions(&self) -> usize {
        self.registry.len()
    }

    #[tracing::instrument(skip(self, text), fields(provider = self.provider.name()))]
    pub async fn send_message(&self, session_id: &str, text: &str) -> ChatOutcome {
        self.sweep_idle().await;

        let handle = self.registry.get_or_create(session_id);
        metrics::set_active_sessions(self.registry.len());

        // Held through publish so the transcript keeps the session's order.
        let mut session = handle.session().lock().await;
        handle.touch();

        let result = session.send(text).await;
        handle.touch();

        match result {
            Ok(raw) => {
                let reply = self.shape(text, raw);
                metrics::record_chat_message("answered");
                tracing::info!(reply_len = reply.len(), "Model replied");

                let report = self
                    .bus
                    .publish(&PortalEvent::TurnCompleted {
                        session_id: session_id.to_string(),
                        user: ChatTurn::user(text),
                        assistant: ChatTurn::assistant(reply.clone()),
                    })
                    .await;

                ChatOutcome {
                    reply,
                    error: false,
                    warnings: warnings(report),
                }
            }
            Err(e) => {
                tracing::error!(error = %e, kind = e.kind(), "Model call failed");
                metrics::record_model_error(self.provider.name(), e.kind());
                metrics::record_chat_message("failed");

                let apology = prompt::apology(&e);
                let report = self
                    .bus
                    .publish(&PortalEvent::TurnFailed {
                        session_id: session_id.to_string(),
                        user: ChatTurn::user(text),
                        apology: ChatTurn::assistant(apology.clone()),
                    })
                    .await;

                ChatOutcome {
                    reply: apology,
                    error: true,
                    warnings: warnings(report),
                }
            }
        }
    }

    /// Reseed the session's model history and clear its transcript.
    #[tracing::instrument(skip(self))]
    pub async fn reset(&self, session_id: &str) -> Vec<String> {
        if let Some(handle) = self.registry.get(session_id) {
            handle.session().lock().await.reset();
        }
        tracing::info!("Chat reset");

        let report = self
            .bus
            .publish(&PortalEvent::TranscriptCleared {
                session_id: session_id.to_string(),
            })
            .await;
        warnings(report)
    }

    pub fn transcript(&self, session_id: &str) -> Vec<ChatTurn> {
        self.transcripts.transcript(session_id)
    }

    /// Model history of a live session, seed pair included.
    pub async fn history(&self, session_id: &str) -> Option<Vec<ChatTurn>> {
        let handle = self.registry.get(session_id)?;
        let session = handle.session().lock().await;
        Some(session.history().to_vec())
    }

    #[tracing::instrument(skip(self, submission), fields(subject = submission.details.subject.label()))]
    pub async fn submit_contact(&self, submission: ContactSubmission) -> Vec<String> {
        metrics::record_contact_submission(submission.details.subject.label());
        tracing::info!("Contact form submitted");

        let report = self
            .bus
            .publish(&PortalEvent::ContactSubmitted(submission))
            .await;
        warnings(report)
    }

    async fn sweep_idle(&self) {
        for session_id in self.registry.evict_idle() {
            self.bus
                .publish(&PortalEvent::SessionEnded { session_id })
                .await;
        }
    }

    fn shape(&self, query: &str, raw: String) -> String {
        let Some(pipeline) = &self.shaping else {
            return raw;
        };

        let kind = classify(query, &raw);
        tracing::debug!(reply_kind = kind.label(), ?kind, "Reply classified");
        pipeline.apply(Reply::new(raw)).text
    }
}

fn warnings(report: PublishReport) -> Vec<String> {
    report
        .failures
        .into_iter()
        .map(|failure| format!("{} consumer failed: {}", failure.consumer, failure.error))
        .collect()
}
