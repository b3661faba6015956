#![allow(dead_code)]

use chat_service::config::ChatConfig;
use chat_service::services::providers::{ChatProvider, MockChatProvider};
use chat_service::services::sink::MemorySink;
use chat_service::startup::Application;
use reqwest::{Client, Response};
use serde_json::{json, Value};
use service_core::config::Config as CoreConfig;
use std::sync::Arc;
use std::time::Duration;

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub sink: Arc<MemorySink>,
    pub client: Client,
}

/// Configuration for tests: random port, mock provider, no real store.
pub fn test_config(extra: &[(&str, &str)]) -> ChatConfig {
    let mut vars: Vec<(String, String)> = vec![("CHAT_MODEL_PROVIDER".into(), "mock".into())];
    vars.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));

    ChatConfig::from_lookup(
        CoreConfig {
            port: 0,
            ..CoreConfig::default()
        },
        |key| {
            vars.iter()
                .rev()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        },
    )
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(Arc::new(MockChatProvider::new()), test_config(&[])).await
    }

    pub async fn spawn_with(provider: Arc<dyn ChatProvider>, config: ChatConfig) -> Self {
        let sink = Arc::new(MemorySink::new());

        let app = Application::build_with(config, sink.clone(), provider)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            sink,
            client,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn send_message(&self, session_id: Option<&str>, message: &str) -> Response {
        let mut request = self
            .client
            .post(self.url("/api/chat/messages"))
            .json(&json!({ "message": message }));
        if let Some(id) = session_id {
            request = request.header("x-session-id", id);
        }
        request.send().await.expect("Failed to send message")
    }

    pub async fn transcript(&self, session_id: &str) -> Value {
        self.client
            .get(self.url("/api/chat/transcript"))
            .header("x-session-id", session_id)
            .send()
            .await
            .expect("Failed to fetch transcript")
            .json()
            .await
            .expect("Transcript was not JSON")
    }

    pub async fn reset(&self, session_id: &str) -> Response {
        self.client
            .post(self.url("/api/chat/reset"))
            .header("x-session-id", session_id)
            .send()
            .await
            .expect("Failed to reset chat")
    }
}
