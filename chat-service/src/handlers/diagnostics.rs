use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::startup::AppState;

#[derive(Debug, Serialize)]
pub struct CheckResult {
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct Environment {
    pub service_version: &'static str,
    pub model_provider: &'static str,
    pub model: String,
    pub api_key: &'static str,
    pub mongodb_uri: String,
    pub database: String,
    pub collection: String,
    pub shape_replies: bool,
    pub active_sessions: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct DiagnosticsReport {
    pub model: CheckResult,
    pub database: CheckResult,
    pub environment: Environment,
    pub config_problems: Vec<String>,
    pub recommendations: Vec<&'static str>,
}

const MODEL_TROUBLESHOOTING: [&str; 4] = [
    "Check GEMINI_API_KEY in the environment or .env file",
    "Make sure the key has access to the Gemini API",
    "Ensure the key has the necessary permissions",
    "Check outbound network connectivity",
];

const DATABASE_TROUBLESHOOTING: [&str; 3] = [
    "Make sure the MongoDB server is running",
    "Check MONGODB_CONNECTION_STRING",
    "Check that the database user has read and write access",
];

/// Connectivity and configuration report for operators.
#[tracing::instrument(skip(state))]
pub async fn run_diagnostics(State(state): State<AppState>) -> Json<DiagnosticsReport> {
    let provider = state.chat.provider();

    let model = match provider.health_check().await {
        Ok(()) => CheckResult {
            ok: true,
            message: format!("{} API connection successful", provider.name()),
        },
        Err(e) => CheckResult {
            ok: false,
            message: format!("{} API error: {}", provider.name(), e),
        },
    };

    let database = match state.sink.health_check().await {
        Ok(()) => CheckResult {
            ok: true,
            message: format!("{} connection successful", state.sink.name()),
        },
        Err(e) => CheckResult {
            ok: false,
            message: format!("{} error: {}", state.sink.name(), e),
        },
    };

    let mut recommendations = Vec::new();
    if !model.ok {
        recommendations.extend(MODEL_TROUBLESHOOTING);
    }
    if !database.ok {
        recommendations.extend(DATABASE_TROUBLESHOOTING);
    }

    let config = &state.config;
    Json(DiagnosticsReport {
        model,
        database,
        environment: Environment {
            service_version: env!("CARGO_PKG_VERSION"),
            model_provider: config.chat.provider.as_str(),
            model: provider.model().to_string(),
            api_key: if config.gemini.api_key.is_some() {
                "configured"
            } else {
                "missing"
            },
            mongodb_uri: config.mongodb.redacted_uri(),
            database: config.mongodb.database.clone(),
            collection: config.mongodb.collection.clone(),
            shape_replies: config.chat.shape_replies,
            active_sessions: state.chat.active_sessions(),
            timestamp: Utc::now(),
        },
        config_problems: config
            .problems()
            .into_iter()
            .map(|problem| problem.to_string())
            .collect(),
        recommendations,
    })
}
