/// HTTP chat API tests against a server bound to an ephemeral port.
mod common;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use larder::adapters::completion::MockCompletionBackend;
use larder::adapters::http::{ChatHttpConfig, ChatHttpServer, ChatResponse, ErrorResponse};
use larder::adapters::session::InMemorySessionStore;
use larder::domain::models::ConversationTurn;
use larder::domain::ports::SessionStore;
use larder::services::{OrchestratorSettings, RetrievalOrchestrator};

struct TestServer {
    base: String,
    shutdown: Option<oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<anyhow::Result<()>>,
}

impl TestServer {
    async fn start(sessions: bool) -> Self {
        Self::start_with(sessions, ChatHttpConfig::default()).await
    }

    async fn start_with(sessions: bool, http_config: ChatHttpConfig) -> Self {
        let settings = OrchestratorSettings {
            sessions_enabled: sessions,
            ..OrchestratorSettings::default()
        };
        let store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new(100));
        let mut orchestrator = RetrievalOrchestrator::new(
            common::StaticEmbedder::new(4),
            common::FixedCorpus::new(common::sample_recipes()),
            Arc::new(MockCompletionBackend::new()),
            settings,
        );
        let mut session_store = None;
        if sessions {
            orchestrator = orchestrator.with_sessions(store.clone());
            session_store = Some(store);
        }
        let mut server = ChatHttpServer::new(http_config, Arc::new(orchestrator));
        if let Some(store) = session_store {
            server = server.with_sessions(store);
        }

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(server.serve_with_listener(listener, async move {
            let _ = rx.await;
        }));

        Self {
            base,
            shutdown: Some(tx),
            handle,
        }
    }

    async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.handle.await.unwrap().unwrap();
    }
}

#[tokio::test]
async fn test_health() {
    let server = TestServer::start(false).await;
    let body = reqwest::get(format!("{}/health", server.base)).await.unwrap().text().await.unwrap();
    assert_eq!(body, "OK");
    server.stop().await;
}

#[tokio::test]
async fn test_chat_round_trip() {
    let server = TestServer::start(false).await;
    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/chat", server.base))
        .json(&serde_json::json!({"message": "something sweet with oats"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: ChatResponse = response.json().await.unwrap();
    assert!(body.ok);
    assert_eq!(body.reply, "Mock recipe suggestion.");
    assert_eq!(body.sources.len(), 3);
    assert!(body.labels.is_empty());
    assert!(body.session_id.is_none());
    server.stop().await;
}

#[tokio::test]
async fn test_empty_request_gets_prompting_reply() {
    let server = TestServer::start(false).await;
    let body: ChatResponse = reqwest::Client::new()
        .post(format!("{}/api/v1/chat", server.base))
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body.reply, "Please provide a message or an image.");
    assert!(body.sources.is_empty());
    server.stop().await;
}

#[tokio::test]
async fn test_invalid_image_rejected() {
    let server = TestServer::start(false).await;
    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/chat", server.base))
        .json(&serde_json::json!({"message": "hi", "image": "%%%"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: ErrorResponse = response.json().await.unwrap();
    assert_eq!(body.code, "INVALID_IMAGE");
    server.stop().await;
}

#[tokio::test]
async fn test_image_without_detector_still_answers() {
    let server = TestServer::start(false).await;
    let body: ChatResponse = reqwest::Client::new()
        .post(format!("{}/api/v1/chat", server.base))
        .json(&serde_json::json!({
            "message": "what is this?",
            "image": STANDARD.encode(b"jpeg"),
            "image_name": "fridge.jpg"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(body.ok);
    assert!(body.labels.is_empty());
    server.stop().await;
}

#[tokio::test]
async fn test_phone_sized_photo_is_accepted() {
    let server = TestServer::start(false).await;
    let photo = vec![0xA5_u8; 3 * 1024 * 1024];
    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/chat", server.base))
        .json(&serde_json::json!({
            "message": "what can I cook?",
            "image": STANDARD.encode(&photo),
            "image_name": "pantry.jpg"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: ChatResponse = response.json().await.unwrap();
    assert!(body.ok);
    assert_eq!(body.reply, "Mock recipe suggestion.");
    server.stop().await;
}

#[tokio::test]
async fn test_body_over_configured_limit_rejected() {
    let http_config = ChatHttpConfig {
        max_body_bytes: 1024,
        ..ChatHttpConfig::default()
    };
    let server = TestServer::start_with(false, http_config).await;
    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/chat", server.base))
        .json(&serde_json::json!({
            "message": "what can I cook?",
            "image": STANDARD.encode(vec![1_u8; 4096]),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 413);
    server.stop().await;
}

#[tokio::test]
async fn test_session_flow() {
    let server = TestServer::start(true).await;
    let client = reqwest::Client::new();

    let first: ChatResponse = client
        .post(format!("{}/api/v1/chat", server.base))
        .json(&serde_json::json!({"message": "I have leeks"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = first.session_id.expect("session id assigned");

    let second: ChatResponse = client
        .post(format!("{}/api/v1/chat", server.base))
        .json(&serde_json::json!({"message": "and potatoes", "session_id": id}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(second.session_id.as_deref(), Some(id.as_str()));

    let turns: Vec<ConversationTurn> = client
        .get(format!("{}/api/v1/sessions/{id}", server.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(turns.len(), 4);
    assert_eq!(turns[0].content, "I have leeks");
    assert_eq!(turns[2].content, "and potatoes");
    server.stop().await;
}
