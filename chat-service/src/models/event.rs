//! Events fanned out by the notification bus.

use super::record::ContactSubmission;
use super::turn::ChatTurn;

#[derive(Debug, Clone, PartialEq)]
pub enum PortalEvent {
    /// The model answered a visitor message.
    TurnCompleted {
        session_id: String,
        user: ChatTurn,
        assistant: ChatTurn,
    },

    /// The model call failed; `apology` is what the visitor sees instead.
    TurnFailed {
        session_id: String,
        user: ChatTurn,
        apology: ChatTurn,
    },

    /// The visitor cleared the chat.
    TranscriptCleared { session_id: String },

    /// The session was evicted after sitting idle.
    SessionEnded { session_id: String },

    ContactSubmitted(ContactSubmission),
}

impl PortalEvent {
    /// Short label used in logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            PortalEvent::TurnCompleted { .. } => "turn_completed",
            PortalEvent::TurnFailed { .. } => "turn_failed",
            PortalEvent::TranscriptCleared { .. } => "transcript_cleared",
            PortalEvent::SessionEnded { .. } => "session_ended",
            PortalEvent::ContactSubmitted(_) => "contact_submitted",
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        match self {
            PortalEvent::TurnCompleted { session_id, .. }
            | PortalEvent::TurnFailed { session_id, .. }
            | PortalEvent::TranscriptCleared { session_id }
            | PortalEvent::SessionEnded { session_id } => Some(session_id),
            PortalEvent::ContactSubmitted(_) => None,
        }
    }
}
