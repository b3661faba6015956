use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::startup::AppState;

/// Liveness. The process is alive even when the conversation store is not,
/// so this reports the store without failing on it.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = match state.sink.health_check().await {
        Ok(()) => json!({ "status": "ok", "backend": state.sink.name() }),
        Err(e) => json!({
            "status": "unavailable",
            "backend": state.sink.name(),
            "error": e.to_string()
        }),
    };

    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "chat-service",
            "version": env!("CARGO_PKG_VERSION"),
            "database": database
        })),
    )
}

/// Readiness: the conversation store must answer a ping.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.sink.health_check().await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
