//! Gemini provider implementation.
//!
//! Sends the whole dialogue to `generateContent` on every turn. The API only
//! knows `user` and `model` roles, so the instruction preamble goes out as a
//! user-authored part, the way a chat seeded through the Gemini SDK does.

use super::{ChatProvider, GenerationParams, ModelError};
use crate::models::{ChatTurn, Role};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Gemini API base URL.
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini provider configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// `None` leaves the provider unusable; every call reports `NotConfigured`.
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    pub timeout: Duration,
    pub params: GenerationParams,
}

pub struct GeminiChatProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiChatProvider {
    pub fn new(config: GeminiConfig) -> Result<Self, ModelError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ModelError::NotConfigured(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn api_key(&self) -> Result<&str, ModelError> {
        self.config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ModelError::NotConfigured("GEMINI_API_KEY is not set".to_string()))
    }

    /// Build the API URL for the given model and method.
    fn api_url(&self, method: &str, api_key: &str) -> String {
        format!(
            "{}/models/{}:{}?key={}",
            self.config.api_base.trim_end_matches('/'),
            self.config.model,
            method,
            api_key
        )
    }

    fn build_request(&self, history: &[ChatTurn]) -> GenerateContentRequest {
        let contents = history
            .iter()
            .map(|turn| Content {
                role: Some(wire_role(turn.role).to_string()),
                parts: vec![ContentPart {
                    text: Some(turn.content.clone()),
                }],
            })
            .collect();

        GenerateContentRequest {
            contents,
            generation_config: Some(GenerationConfig {
                temperature: Some(self.config.params.temperature),
                top_p: Some(self.config.params.top_p),
                top_k: Some(self.config.params.top_k),
            }),
        }
    }
}

fn wire_role(role: Role) -> &'static str {
    match role {
        Role::Assistant => "model",
        Role::User | Role::System => "user",
    }
}

// The request URL carries the API key; keep it out of error text.
fn map_transport_error(e: reqwest::Error) -> ModelError {
    if e.is_timeout() {
        ModelError::Timeout
    } else {
        ModelError::Network(e.without_url().to_string())
    }
}

#[async_trait]
impl ChatProvider for GeminiChatProvider {
    async fn generate(&self, history: &[ChatTurn]) -> Result<String, ModelError> {
        let api_key = self.api_key()?;
        let request = self.build_request(history);
        let url = self.api_url("generateContent", api_key);

        tracing::debug!(
            model = %self.config.model,
            turns = history.len(),
            "Sending request to Gemini API"
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => ModelError::RateLimited,
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ModelError::Auth(error_text),
                _ => ModelError::Api(format!("Gemini API error {}: {}", status, error_text)),
            });
        }

        let api_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ModelError::MalformedResponse(e.without_url().to_string()))?;

        if api_response
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_ref())
            .is_some()
        {
            return Err(ModelError::ContentFiltered);
        }

        let candidate = api_response
            .candidates
            .first()
            .ok_or(ModelError::EmptyReply)?;

        if candidate.finish_reason.as_deref() == Some("SAFETY") {
            return Err(ModelError::ContentFiltered);
        }

        let text: String = candidate
            .content
            .as_ref()
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ModelError::EmptyReply);
        }

        if let Some(usage) = api_response.usage_metadata {
            tracing::debug!(
                model = %self.config.model,
                input_tokens = usage.prompt_token_count.unwrap_or(0),
                output_tokens = usage.candidates_token_count.unwrap_or(0),
                "Gemini reply received"
            );
        }

        Ok(text)
    }

    async fn health_check(&self) -> Result<(), ModelError> {
        let api_key = self.api_key()?;

        // Listing models is enough to prove the key works.
        let url = format!(
            "{}/models?key={}",
            self.config.api_base.trim_end_matches('/'),
            api_key
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(map_transport_error)?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ModelError::Auth(format!(
                "Health check failed: {}",
                response.status()
            ))),
            status => Err(ModelError::Api(format!("Health check failed: {}", status))),
        }
    }

    fn name(&self) -> &'static str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ContentPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<i32>,
    candidates_token_count: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::prompt::seed_pair;
    use axum::{extract::State, http::StatusCode as AxumStatus, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;

    type Captured = Arc<Mutex<Option<Value>>>;

    /// Serve a fake `generateContent` endpoint returning `status` and `body`.
    async fn spawn_fake_gemini(status: u16, body: Value) -> (String, Captured) {
        let captured: Captured = Arc::new(Mutex::new(None));

        let handler = {
            let body = body.clone();
            move |State(captured): State<Captured>, Json(request): Json<Value>| {
                let body = body.clone();
                async move {
                    *captured.lock().unwrap() = Some(request);
                    (
                        AxumStatus::from_u16(status).unwrap(),
                        Json(body),
                    )
                }
            }
        };

        let router = Router::new()
            .route(
                "/models/gemini-2.0-flash:generateContent",
                post(handler),
            )
            .with_state(captured.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });

        (format!("http://127.0.0.1:{}", port), captured)
    }

    fn provider(api_base: String, api_key: Option<&str>) -> GeminiChatProvider {
        GeminiChatProvider::new(GeminiConfig {
            api_key: api_key.map(str::to_string),
            model: "gemini-2.0-flash".to_string(),
            api_base,
            timeout: Duration::from_secs(5),
            params: GenerationParams::default(),
        })
        .unwrap()
    }

    fn history_with(question: &str) -> Vec<ChatTurn> {
        let mut history = seed_pair().to_vec();
        history.push(ChatTurn::user(question));
        history
    }

    #[tokio::test]
    async fn sends_history_with_mapped_roles_and_fixed_sampling() {
        let (base, captured) = spawn_fake_gemini(
            200,
            json!({
                "candidates": [{
                    "content": { "role": "model", "parts": [{ "text": "CIC offers " }, { "text": "five schools." }] },
                    "finishReason": "STOP"
                }],
                "usageMetadata": { "promptTokenCount": 900, "candidatesTokenCount": 6 }
            }),
        )
        .await;

        let reply = provider(base, Some("test-key"))
            .generate(&history_with("What programs are offered at CIC?"))
            .await
            .unwrap();
        assert_eq!(reply, "CIC offers five schools.");

        let request = captured.lock().unwrap().clone().unwrap();
        let contents = request["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[2]["parts"][0]["text"], "What programs are offered at CIC?");
        assert_eq!(request["generationConfig"]["topK"], 64);
    }

    #[tokio::test]
    async fn empty_candidate_is_an_error() {
        let (base, _) = spawn_fake_gemini(
            200,
            json!({ "candidates": [{ "content": { "parts": [{ "text": "  " }] } }] }),
        )
        .await;

        let err = provider(base, Some("test-key"))
            .generate(&history_with("hi"))
            .await
            .unwrap_err();
        assert_eq!(err, ModelError::EmptyReply);
    }

    #[tokio::test]
    async fn quota_exhaustion_maps_to_rate_limited() {
        let (base, _) =
            spawn_fake_gemini(429, json!({ "error": { "message": "quota" } })).await;

        let err = provider(base, Some("test-key"))
            .generate(&history_with("hi"))
            .await
            .unwrap_err();
        assert_eq!(err, ModelError::RateLimited);
    }

    #[tokio::test]
    async fn safety_block_maps_to_content_filtered() {
        let (base, _) = spawn_fake_gemini(
            200,
            json!({ "candidates": [{ "finishReason": "SAFETY" }] }),
        )
        .await;

        let err = provider(base, Some("test-key"))
            .generate(&history_with("hi"))
            .await
            .unwrap_err();
        assert_eq!(err, ModelError::ContentFiltered);
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let provider = provider("http://127.0.0.1:9".to_string(), None);

        let err = provider.generate(&history_with("hi")).await.unwrap_err();
        assert!(matches!(err, ModelError::NotConfigured(_)));

        let err = provider.health_check().await.unwrap_err();
        assert!(matches!(err, ModelError::NotConfigured(_)));
    }
}
