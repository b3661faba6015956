//! Best-effort log of conversation records.
//!
//! Writes never abort the chat flow: callers turn a `PersistError` into a
//! warning and carry on, accepting the loss of that one record.

pub mod memory;
pub mod mongo;

use crate::models::ConversationRecord;
use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemorySink;
pub use mongo::{MongoSink, MongoSinkConfig};

/// Largest page `list_recent` will return.
pub const MAX_LIST_LIMIT: i64 = 100;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PersistError {
    #[error("Conversation store unavailable: {0}")]
    Unavailable(String),

    #[error("Conversation store error: {0}")]
    Database(String),

    #[error("Failed to encode conversation record: {0}")]
    Serialization(String),
}

impl From<mongodb::error::Error> for PersistError {
    fn from(err: mongodb::error::Error) -> Self {
        PersistError::Database(err.to_string())
    }
}

impl From<PersistError> for service_core::error::AppError {
    fn from(err: PersistError) -> Self {
        service_core::error::AppError::DatabaseError(anyhow::Error::new(err))
    }
}

#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Insert `record` and return its identifier.
    async fn save(&self, record: &ConversationRecord) -> Result<String, PersistError>;

    /// Up to `limit` records, newest first.
    async fn list_recent(&self, limit: i64) -> Result<Vec<ConversationRecord>, PersistError>;

    /// Point lookup. Unknown or malformed ids yield `Ok(None)`.
    async fn get_by_id(&self, id: &str) -> Result<Option<ConversationRecord>, PersistError>;

    /// Round trip to the backing store.
    async fn health_check(&self) -> Result<(), PersistError>;

    /// Backend name for logs and diagnostics.
    fn name(&self) -> &'static str;
}

/// Page size actually served. Zero or negative requests get nothing.
pub(crate) fn clamp_limit(limit: i64) -> i64 {
    limit.clamp(0, MAX_LIST_LIMIT)
}
