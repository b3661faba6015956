//! Domain models for the chat service.

pub mod event;
pub mod record;
pub mod turn;

pub use event::PortalEvent;
pub use record::{
    ContactDetails, ContactSubject, ContactSubmission, ConversationRecord, RecordKind,
};
pub use turn::{ChatTurn, Role};
