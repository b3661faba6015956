//! MongoDB-backed conversation log.

use super::{clamp_limit, PersistError, RecordSink};
use crate::models::ConversationRecord;
use crate::services::metrics;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId},
    options::{ClientOptions, FindOptions, IndexOptions},
    Client as MongoClient, Collection, IndexModel,
};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct MongoSinkConfig {
    pub uri: String,
    pub database: String,
    pub collection: String,
    /// Bounds both server selection and connection setup.
    pub server_selection_timeout: Duration,
}

#[derive(Clone)]
enum SinkState {
    Connected {
        client: MongoClient,
        collection: Collection<ConversationRecord>,
    },
    Unavailable {
        reason: String,
    },
}

/// Conversation log in one MongoDB collection.
///
/// The connection is made once in [`MongoSink::connect`]. If that fails the
/// sink stays unavailable and every call returns `PersistError::Unavailable`
/// straight away.
#[derive(Clone)]
pub struct MongoSink {
    state: SinkState,
    collection_name: String,
}

impl MongoSink {
    pub async fn connect(config: &MongoSinkConfig) -> Self {
        tracing::info!(
            database = %config.database,
            collection = %config.collection,
            "Connecting to MongoDB"
        );

        match Self::try_connect(config).await {
            Ok(sink) => {
                tracing::info!(
                    database = %config.database,
                    "Successfully connected to MongoDB database"
                );
                sink.initialize_indexes().await;
                sink
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    "Failed to connect to MongoDB; conversations will not be saved"
                );
                Self {
                    state: SinkState::Unavailable {
                        reason: e.to_string(),
                    },
                    collection_name: config.collection.clone(),
                }
            }
        }
    }

    async fn try_connect(config: &MongoSinkConfig) -> Result<Self, PersistError> {
        let mut options = ClientOptions::parse(&config.uri)
            .await
            .map_err(|e| PersistError::Unavailable(e.to_string()))?;
        options.server_selection_timeout = Some(config.server_selection_timeout);
        options.connect_timeout = Some(config.server_selection_timeout);
        options.app_name = Some("chat-service".to_string());

        let client = MongoClient::with_options(options)
            .map_err(|e| PersistError::Unavailable(e.to_string()))?;

        // The driver connects lazily; ping to find out now.
        client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| PersistError::Unavailable(e.to_string()))?;

        let collection = client
            .database(&config.database)
            .collection::<ConversationRecord>(&config.collection);

        Ok(Self {
            state: SinkState::Connected { client, collection },
            collection_name: config.collection.clone(),
        })
    }

    /// Index creation failures are logged, not fatal.
    async fn initialize_indexes(&self) {
        let Ok(collection) = self.collection() else {
            return;
        };

        let indexes = [
            IndexModel::builder()
                .keys(doc! { "created_at": -1 })
                .options(
                    IndexOptions::builder()
                        .name("created_at_idx".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "kind": 1, "created_at": -1 })
                .options(
                    IndexOptions::builder()
                        .name("kind_created_at_idx".to_string())
                        .build(),
                )
                .build(),
        ];

        for index in indexes {
            if let Err(e) = collection.create_index(index, None).await {
                tracing::warn!(
                    collection = %self.collection_name,
                    error = %e,
                    "Failed to create conversation index"
                );
            }
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.state, SinkState::Connected { .. })
    }

    /// Why the sink is unavailable, if it is.
    pub fn unavailable_reason(&self) -> Option<&str> {
        match &self.state {
            SinkState::Connected { .. } => None,
            SinkState::Unavailable { reason } => Some(reason),
        }
    }

    fn collection(&self) -> Result<&Collection<ConversationRecord>, PersistError> {
        match &self.state {
            SinkState::Connected { collection, .. } => Ok(collection),
            SinkState::Unavailable { reason } => Err(PersistError::Unavailable(reason.clone())),
        }
    }

    fn observe<T>(
        &self,
        operation: &str,
        started: Instant,
        result: Result<T, PersistError>,
    ) -> Result<T, PersistError> {
        metrics::record_db_operation(
            operation,
            &self.collection_name,
            started.elapsed().as_secs_f64(),
        );
        if let Err(e) = &result {
            tracing::error!(operation, error = %e, "Conversation store operation failed");
            metrics::record_db_error(operation, &self.collection_name);
        }
        result
    }
}

#[async_trait]
impl RecordSink for MongoSink {
    async fn save(&self, record: &ConversationRecord) -> Result<String, PersistError> {
        let collection = match self.collection() {
            Ok(collection) => collection,
            Err(e) => {
                metrics::record_db_error("insert", &self.collection_name);
                return Err(e);
            }
        };

        let started = Instant::now();
        let result = collection
            .insert_one(record, None)
            .await
            .map_err(PersistError::from)
            .map(|inserted| match inserted.inserted_id.as_object_id() {
                Some(id) => id.to_hex(),
                None => inserted.inserted_id.to_string(),
            });

        let id = self.observe("insert", started, result)?;
        tracing::debug!(record_id = %id, kind = %record.kind, "Saved conversation record");
        Ok(id)
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<ConversationRecord>, PersistError> {
        let collection = self.collection()?;

        // A zero limit means "no limit" to MongoDB.
        let limit = clamp_limit(limit);
        if limit == 0 {
            return Ok(Vec::new());
        }

        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .limit(limit)
            .build();

        let started = Instant::now();
        let result = async {
            let cursor = collection.find(doc! {}, options).await?;
            let records: Vec<ConversationRecord> = cursor.try_collect().await?;
            Ok::<_, mongodb::error::Error>(records)
        }
        .await
        .map_err(PersistError::from);

        self.observe("find", started, result)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<ConversationRecord>, PersistError> {
        let collection = self.collection()?;

        let Ok(object_id) = ObjectId::parse_str(id) else {
            return Ok(None);
        };

        let started = Instant::now();
        let result = collection
            .find_one(doc! { "_id": object_id }, None)
            .await
            .map_err(PersistError::from);

        self.observe("find_one", started, result)
    }

    async fn health_check(&self) -> Result<(), PersistError> {
        match &self.state {
            SinkState::Connected { client, .. } => {
                client
                    .database("admin")
                    .run_command(doc! { "ping": 1 }, None)
                    .await
                    .map_err(|e| {
                        tracing::error!("MongoDB health check failed: {}", e);
                        PersistError::from(e)
                    })?;
                Ok(())
            }
            SinkState::Unavailable { reason } => Err(PersistError::Unavailable(reason.clone())),
        }
    }

    fn name(&self) -> &'static str {
        "mongodb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_config() -> MongoSinkConfig {
        MongoSinkConfig {
            uri: "mongodb://127.0.0.1:1/?directConnection=true".to_string(),
            database: "chat_test_db".to_string(),
            collection: "conversations".to_string(),
            server_selection_timeout: Duration::from_millis(300),
        }
    }

    #[tokio::test]
    async fn unreachable_store_degrades_to_unavailable_sink() {
        let sink = MongoSink::connect(&unreachable_config()).await;

        assert!(!sink.is_available());
        assert!(sink.unavailable_reason().is_some());
        assert!(matches!(
            sink.health_check().await,
            Err(PersistError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn saves_against_unreachable_store_fail_fast_every_time() {
        let sink = MongoSink::connect(&unreachable_config()).await;
        let record = ConversationRecord::chat_turn("s-1", "hi", "hello");

        for _ in 0..3 {
            let outcome = tokio::time::timeout(Duration::from_secs(2), sink.save(&record))
                .await
                .expect("save must not hang");
            assert!(matches!(outcome, Err(PersistError::Unavailable(_))));
        }
    }

    #[tokio::test]
    async fn malformed_uri_is_unavailable_not_a_panic() {
        let sink = MongoSink::connect(&MongoSinkConfig {
            uri: "not-a-mongo-uri".to_string(),
            ..unreachable_config()
        })
        .await;

        assert!(!sink.is_available());
        assert!(sink.list_recent(10).await.is_err());
        assert!(sink.get_by_id("65f0c0ffee0000000000abcd").await.is_err());
    }
}
