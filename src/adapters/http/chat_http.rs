//! Chat HTTP Server.
//!
//! Exposes the retrieval orchestrator to browser and script clients. Images
//! travel as base64 inside the JSON body.

use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::domain::models::{Answer, AnswerRequest, ConversationTurn, ImageInput, ServerConfig, SourceRef};
use crate::domain::ports::SessionStore;
use crate::services::RetrievalOrchestrator;

/// Configuration for the chat HTTP server.
#[derive(Debug, Clone)]
pub struct ChatHttpConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Whether to enable CORS.
    pub enable_cors: bool,
    /// Request body limit in bytes.
    pub max_body_bytes: usize,
}

impl Default for ChatHttpConfig {
    fn default() -> Self {
        Self::from(&ServerConfig::default())
    }
}

impl From<&ServerConfig> for ChatHttpConfig {
    fn from(config: &ServerConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            enable_cors: config.enable_cors,
            max_body_bytes: config.max_body_bytes,
        }
    }
}

/// Body of `POST /api/v1/chat`.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    /// Base64-encoded image bytes.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub image_name: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Reply to `POST /api/v1/chat`.
#[derive(Debug, Deserialize, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub ok: bool,
    pub labels: Vec<String>,
    pub sources: Vec<SourceRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl From<Answer> for ChatResponse {
    fn from(answer: Answer) -> Self {
        Self {
            reply: answer.text,
            ok: answer.ok,
            labels: answer.detected_labels,
            sources: answer.sources,
            session_id: answer.session_id,
        }
    }
}

/// Error body.
#[derive(Debug, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, code: &str, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.to_string(),
        }),
    )
}

#[derive(Clone)]
struct AppState {
    orchestrator: Arc<RetrievalOrchestrator>,
    sessions: Option<Arc<dyn SessionStore>>,
}

/// Chat HTTP server.
pub struct ChatHttpServer {
    config: ChatHttpConfig,
    orchestrator: Arc<RetrievalOrchestrator>,
    sessions: Option<Arc<dyn SessionStore>>,
}

impl ChatHttpServer {
    pub fn new(config: ChatHttpConfig, orchestrator: Arc<RetrievalOrchestrator>) -> Self {
        Self {
            config,
            orchestrator,
            sessions: None,
        }
    }

    /// Serve `GET /api/v1/sessions/{id}` from this store.
    pub fn with_sessions(mut self, sessions: Arc<dyn SessionStore>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    /// Build the router.
    pub fn build_router(&self) -> Router {
        let state = AppState {
            orchestrator: self.orchestrator.clone(),
            sessions: self.sessions.clone(),
        };

        let app = Router::new()
            .route("/api/v1/chat", post(chat))
            .route("/api/v1/sessions/{id}", get(get_session))
            .route("/health", get(health_check))
            .layer(DefaultBodyLimit::max(self.config.max_body_bytes))
            .with_state(state);

        if self.config.enable_cors {
            app.layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
                .layer(TraceLayer::new_for_http())
        } else {
            app.layer(TraceLayer::new_for_http())
        }
    }

    /// Bind the configured address and serve until `shutdown` resolves.
    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;
        let listener = TcpListener::bind(addr).await?;
        self.serve_with_listener(listener, shutdown).await
    }

    /// Serve on an already-bound listener until `shutdown` resolves.
    pub async fn serve_with_listener<F>(self, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.build_router();
        info!(addr = %listener.local_addr()?, "chat HTTP server listening");
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}

async fn health_check() -> &'static str {
    "OK"
}

async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let image = match req.image.as_deref().map(str::trim) {
        Some(encoded) if !encoded.is_empty() => {
            let bytes = STANDARD.decode(encoded).map_err(|e| {
                warn!(error = %e, "rejecting undecodable image");
                api_error(
                    StatusCode::BAD_REQUEST,
                    "INVALID_IMAGE",
                    format!("image is not valid base64: {e}"),
                )
            })?;
            Some(ImageInput::new(bytes, req.image_name))
        }
        _ => None,
    };

    let request = AnswerRequest {
        text: req.message.unwrap_or_default(),
        image,
        session_id: req.session_id,
    };

    let answer = state.orchestrator.respond(request).await;
    Ok(Json(ChatResponse::from(answer)))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ConversationTurn>>, ApiError> {
    let Some(sessions) = state.sessions else {
        return Err(api_error(
            StatusCode::NOT_FOUND,
            "SESSIONS_DISABLED",
            "conversation sessions are not enabled",
        ));
    };

    sessions.get(&id).await.map(Json).map_err(|e| {
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "SESSION_ERROR", e.to_string())
    })
}
