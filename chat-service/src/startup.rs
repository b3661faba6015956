//! Application startup and lifecycle management.

use crate::config::{ChatConfig, ProviderKind};
use crate::handlers::{chat, contact, conversations, diagnostics, health, metrics};
use crate::services::metrics::init_metrics;
use crate::services::providers::{
    ChatProvider, GeminiChatProvider, GeminiConfig, GenerationParams, MockChatProvider,
};
use crate::services::sink::{MongoSink, MongoSinkConfig, RecordSink};
use crate::services::{ChatOptions, ChatService};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    make_request_span, request_id_middleware, security_headers_middleware,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ChatConfig>,
    pub chat: Arc<ChatService>,
    pub sink: Arc<dyn RecordSink>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(metrics::metrics_handler))
        .route("/api/chat/messages", post(chat::send_message))
        .route("/api/chat/reset", post(chat::reset))
        .route("/api/chat/transcript", get(chat::transcript))
        .route("/api/chat/samples", get(chat::samples))
        .route("/api/contact", post(contact::submit_contact))
        .route("/api/conversations", get(conversations::list_conversations))
        .route("/api/conversations/:id", get(conversations::get_conversation))
        .route("/api/diagnostics", get(diagnostics::run_diagnostics))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// Select the model backend named by the configuration.
pub fn build_provider(config: &ChatConfig) -> Result<Arc<dyn ChatProvider>, AppError> {
    match config.chat.provider {
        ProviderKind::Mock => {
            tracing::warn!("Using mock model provider; replies are canned");
            Ok(Arc::new(MockChatProvider::new()))
        }
        ProviderKind::Gemini => {
            let provider = GeminiChatProvider::new(GeminiConfig {
                api_key: config.gemini.api_key.clone(),
                model: config.gemini.model.clone(),
                api_base: config.gemini.api_base.clone(),
                timeout: config.gemini.timeout,
                params: GenerationParams::default(),
            })
            .map_err(|e| AppError::ConfigError(anyhow::Error::new(e)))?;

            tracing::info!(model = %config.gemini.model, "Initialized Gemini chat provider");
            Ok(Arc::new(provider))
        }
    }
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    ///
    /// An unreachable MongoDB does not fail the build; the service runs
    /// without saving conversations.
    pub async fn build(config: ChatConfig) -> Result<Self, AppError> {
        let sink = MongoSink::connect(&MongoSinkConfig {
            uri: config.mongodb.uri.clone(),
            database: config.mongodb.database.clone(),
            collection: config.mongodb.collection.clone(),
            server_selection_timeout: config.mongodb.timeout,
        })
        .await;

        let provider = build_provider(&config)?;
        Self::build_with(config, Arc::new(sink), provider).await
    }

    /// Build with explicit backends, for tests and embedding.
    pub async fn build_with(
        config: ChatConfig,
        sink: Arc<dyn RecordSink>,
        provider: Arc<dyn ChatProvider>,
    ) -> Result<Self, AppError> {
        init_metrics();

        for problem in config.problems() {
            tracing::warn!(problem = %problem, "Configuration problem");
        }

        let chat = ChatService::new(
            provider,
            sink.clone(),
            ChatOptions {
                session_ttl: config.chat.session_ttl,
                shape_replies: config.chat.shape_replies,
            },
        );

        // Bind HTTP listener (port 0 = random port for testing)
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            port,
            sink = sink.name(),
            provider = chat.provider().name(),
            "Chat service listening"
        );

        Ok(Self {
            port,
            listener,
            state: AppState {
                config: Arc::new(config),
                chat: Arc::new(chat),
                sink,
            },
        })
    }

    /// Get the HTTP port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.run_with_shutdown(std::future::pending()).await
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    pub async fn run_with_shutdown<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = build_router(self.state);

        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                std::io::Error::other(format!("HTTP server error: {}", e))
            })
    }
}
