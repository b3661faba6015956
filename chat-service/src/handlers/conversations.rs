use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ContactDetails, ConversationRecord, RecordKind};
use crate::startup::AppState;
use service_core::error::AppError;

const DEFAULT_LIMIT: i64 = 20;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

/// JSON view of a stored record: hex id and RFC 3339 timestamp.
#[derive(Debug, Serialize)]
pub struct RecordResponse {
    pub id: Option<String>,
    pub kind: RecordKind,
    pub user_query: String,
    pub bot_response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<ContactDetails>,
    pub created_at: DateTime<Utc>,
}

impl From<ConversationRecord> for RecordResponse {
    fn from(record: ConversationRecord) -> Self {
        Self {
            id: record.id_hex(),
            kind: record.kind,
            user_query: record.user_query,
            bot_response: record.bot_response,
            session_id: record.session_id,
            contact: record.contact,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub records: Vec<RecordResponse>,
    pub count: usize,
}

#[tracing::instrument(skip(state))]
pub async fn list_conversations(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, AppError> {
    let records = state
        .sink
        .list_recent(query.limit.unwrap_or(DEFAULT_LIMIT))
        .await?;

    let records: Vec<RecordResponse> = records.into_iter().map(RecordResponse::from).collect();
    Ok(Json(ListResponse {
        count: records.len(),
        records,
    }))
}

#[tracing::instrument(skip(state))]
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RecordResponse>, AppError> {
    let record = state.sink.get_by_id(&id).await?.ok_or_else(|| {
        AppError::NotFound(anyhow::anyhow!("Conversation record {} not found", id))
    })?;

    Ok(Json(record.into()))
}
