use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{not_blank, SessionId};
use crate::models::ChatTurn;
use crate::services::prompt::SAMPLE_QUESTIONS;
use crate::startup::AppState;
use service_core::error::AppError;

#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(
        length(max = 4000, message = "Message is too long"),
        custom(function = "not_blank")
    )]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub session_id: String,
    pub reply: String,
    /// True when `reply` is an apology for a failed model call.
    pub error: bool,
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub session_id: String,
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub session_id: String,
    pub turns: Vec<ChatTurn>,
}

#[derive(Debug, Serialize)]
pub struct SamplesResponse {
    pub questions: Vec<&'static str>,
}

#[tracing::instrument(skip(state, session, request), fields(session_id = %session.as_str()))]
pub async fn send_message(
    State(state): State<AppState>,
    session: SessionId,
    Json(request): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;

    let outcome = state
        .chat
        .send_message(session.as_str(), request.message.trim())
        .await;

    for warning in &outcome.warnings {
        tracing::warn!(warning = %warning, "Chat turn completed with warnings");
    }

    Ok((
        session.header(),
        Json(SendMessageResponse {
            session_id: session.0.clone(),
            reply: outcome.reply,
            error: outcome.error,
            warnings: outcome.warnings,
        }),
    ))
}

#[tracing::instrument(skip(state, session), fields(session_id = %session.as_str()))]
pub async fn reset(State(state): State<AppState>, session: SessionId) -> impl IntoResponse {
    let warnings = state.chat.reset(session.as_str()).await;

    (
        session.header(),
        Json(ResetResponse {
            session_id: session.0.clone(),
            warnings,
        }),
    )
}

pub async fn transcript(State(state): State<AppState>, session: SessionId) -> impl IntoResponse {
    let turns = state.chat.transcript(session.as_str());

    (
        session.header(),
        Json(TranscriptResponse {
            session_id: session.0.clone(),
            turns,
        }),
    )
}

pub async fn samples() -> Json<SamplesResponse> {
    Json(SamplesResponse {
        questions: SAMPLE_QUESTIONS.to_vec(),
    })
}
