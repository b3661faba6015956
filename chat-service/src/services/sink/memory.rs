//! In-process conversation log for tests and local development.

use super::{clamp_limit, PersistError, RecordSink};
use crate::models::ConversationRecord;
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};

/// Keeps records in insertion order; can be switched offline to exercise
/// the degraded path.
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<ConversationRecord>>,
    offline: AtomicBool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `PersistError::Unavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// All stored records, oldest first.
    pub fn records(&self) -> Vec<ConversationRecord> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ConversationRecord>> {
        match self.records.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn check_online(&self) -> Result<(), PersistError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(PersistError::Unavailable("memory sink is offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn save(&self, record: &ConversationRecord) -> Result<String, PersistError> {
        self.check_online()?;

        let id = ObjectId::new();
        let mut stored = record.clone();
        stored.id = Some(id);
        self.lock().push(stored);
        Ok(id.to_hex())
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<ConversationRecord>, PersistError> {
        self.check_online()?;

        let mut records = self.records();
        // Stable sort keeps later inserts first among equal timestamps.
        records.reverse();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records.truncate(clamp_limit(limit) as usize);
        Ok(records)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<ConversationRecord>, PersistError> {
        self.check_online()?;

        let Ok(object_id) = ObjectId::parse_str(id) else {
            return Ok(None);
        };
        Ok(self
            .lock()
            .iter()
            .find(|record| record.id == Some(object_id))
            .cloned())
    }

    async fn health_check(&self) -> Result<(), PersistError> {
        self.check_online()
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn save_then_get_round_trips() {
        let sink = MemorySink::new();
        let record = ConversationRecord::chat_turn("s-1", "Where is CIC?", "New Cairo.");

        let id = sink.save(&record).await.unwrap();
        let fetched = sink.get_by_id(&id).await.unwrap().unwrap();

        assert_eq!(fetched.id_hex().as_deref(), Some(id.as_str()));
        assert_eq!(
            fetched,
            ConversationRecord {
                id: fetched.id,
                ..record
            }
        );
    }

    #[tokio::test]
    async fn unknown_and_malformed_ids_are_not_found() {
        let sink = MemorySink::new();
        assert!(sink.get_by_id(&ObjectId::new().to_hex()).await.unwrap().is_none());
        assert!(sink.get_by_id("not-an-id").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_recent_is_newest_first_and_limited() {
        let sink = MemorySink::new();
        let base = ConversationRecord::chat_turn("s-1", "q", "a");
        for minutes in [5, 1, 3] {
            let mut record = base.clone();
            record.user_query = format!("q{}", minutes);
            record.created_at = base.created_at + Duration::minutes(minutes);
            sink.save(&record).await.unwrap();
        }

        let recent = sink.list_recent(2).await.unwrap();
        let queries: Vec<&str> = recent.iter().map(|r| r.user_query.as_str()).collect();
        assert_eq!(queries, vec!["q5", "q3"]);
    }

    #[tokio::test]
    async fn zero_limit_lists_nothing() {
        let sink = MemorySink::new();
        sink.save(&ConversationRecord::chat_turn("s-1", "q", "a"))
            .await
            .unwrap();

        assert!(sink.list_recent(0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn offline_sink_reports_unavailable() {
        let sink = MemorySink::new();
        sink.set_offline(true);

        let record = ConversationRecord::chat_turn("s-1", "q", "a");
        assert!(matches!(
            sink.save(&record).await,
            Err(PersistError::Unavailable(_))
        ));
        assert!(sink.records().is_empty());
    }
}
