//! Retrieval orchestrator: detection, embedding, corpus search, prompt
//! assembly and completion, strictly in that order.
//!
//! Every collaborator except the completion backend fails open: a broken
//! detector, embedder or corpus store degrades the answer instead of
//! failing it. A completion failure is reported with a fixed user-facing
//! message; the raw detail only goes to the logs.

use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use super::prompt_composer::PromptComposer;
use crate::domain::models::{
    labels_from_detections, recent_messages, Answer, AnswerRequest, ChatMessage, CompletionInput,
    Config, ConversationTurn, CorpusRecord, ImageInput, Query, SourceRef,
};
use crate::domain::ports::{
    ensure_dimension, CompletionBackend, CorpusStore, EmbeddingProvider, ObjectDetector,
    SessionStore,
};

/// Returned without contacting any backend when there is nothing to answer.
pub const NO_INPUT_MESSAGE: &str = "Please provide a message or an image.";

/// Returned when the completion backend reports a failure.
pub const COMPLETION_FAILED_MESSAGE: &str =
    "Sorry, I couldn't reach the recipe assistant right now. Please try again in a moment.";

/// Tunables for one orchestrator instance.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub top_k: usize,
    pub min_confidence: f32,
    pub stream: bool,
    pub sessions_enabled: bool,
    pub history_turns: usize,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for OrchestratorSettings {
    fn from(config: &Config) -> Self {
        Self {
            top_k: config.retrieval.top_k,
            min_confidence: config.detection.min_confidence,
            stream: config.completion.stream,
            sessions_enabled: config.session.enabled,
            history_turns: config.session.history_turns,
        }
    }
}

pub struct RetrievalOrchestrator {
    embedder: Arc<dyn EmbeddingProvider>,
    corpus: Arc<dyn CorpusStore>,
    completion: Arc<dyn CompletionBackend>,
    detector: Option<Arc<dyn ObjectDetector>>,
    sessions: Option<Arc<dyn SessionStore>>,
    composer: PromptComposer,
    settings: OrchestratorSettings,
}

impl RetrievalOrchestrator {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        corpus: Arc<dyn CorpusStore>,
        completion: Arc<dyn CompletionBackend>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            embedder,
            corpus,
            completion,
            detector: None,
            sessions: None,
            composer: PromptComposer::new(),
            settings,
        }
    }

    pub fn with_detector(mut self, detector: Arc<dyn ObjectDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    pub fn with_sessions(mut self, sessions: Arc<dyn SessionStore>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    pub fn completion_backend(&self) -> &str {
        self.completion.name()
    }

    /// Answer text only.
    pub async fn answer(&self, query_text: &str, image: Option<&ImageInput>) -> String {
        let mut request = AnswerRequest::new(query_text);
        request.image = image.cloned();
        self.respond(request).await.text
    }

    /// Run the full pipeline for one request.
    #[instrument(skip_all, fields(has_image = request.image.is_some(), session = ?request.session_id))]
    pub async fn respond(&self, request: AnswerRequest) -> Answer {
        let session_id = self.session_id_for(request.session_id);

        let labels = match request.image.as_ref() {
            Some(image) => self.detect_labels(image).await,
            None => Vec::new(),
        };

        let query = Query::new(request.text, labels);
        let Some(seed) = self.composer.question(query.text(), &query.detected_labels) else {
            debug!("no text and no labels, skipping retrieval");
            return Answer {
                text: NO_INPUT_MESSAGE.to_string(),
                ok: true,
                detected_labels: Vec::new(),
                sources: Vec::new(),
                session_id,
            };
        };

        let retrieved = self.retrieve(&seed).await;
        let prompt = self
            .composer
            .compose(query.text(), &query.detected_labels, &retrieved);
        let sources: Vec<SourceRef> = retrieved.iter().map(SourceRef::from).collect();

        let history_key = session_id.as_deref().filter(|_| self.sessions.is_some());
        let input = match history_key {
            Some(id) => CompletionInput::Messages(self.history_messages(id, prompt).await),
            None => CompletionInput::Prompt(prompt),
        };

        let result = self.completion.complete(input, self.settings.stream).await;
        if !result.ok {
            error!(
                backend = self.completion.name(),
                detail = result.error_detail.as_deref().unwrap_or_default(),
                "completion failed"
            );
            return Answer {
                text: COMPLETION_FAILED_MESSAGE.to_string(),
                ok: false,
                detected_labels: query.detected_labels,
                sources,
                session_id,
            };
        }

        if let Some(id) = history_key {
            let image_ref = request.image.as_ref().and_then(|i| i.file_name.clone());
            self.record_exchange(id, &seed, image_ref, &result.text).await;
        }

        info!(
            labels = query.detected_labels.len(),
            sources = sources.len(),
            "answer ready"
        );
        Answer {
            text: result.text,
            ok: true,
            detected_labels: query.detected_labels,
            sources,
            session_id,
        }
    }

    fn session_id_for(&self, requested: Option<String>) -> Option<String> {
        if !self.settings.sessions_enabled {
            return None;
        }
        Some(
            requested
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
        )
    }

    async fn detect_labels(&self, image: &ImageInput) -> Vec<String> {
        if image.is_empty() {
            return Vec::new();
        }
        let Some(detector) = self.detector.as_ref() else {
            warn!("image supplied but no detector configured");
            return Vec::new();
        };
        match detector.detect(image).await {
            Ok(detections) => labels_from_detections(&detections, self.settings.min_confidence),
            Err(e) => {
                warn!(error = %e, "object detection failed, continuing without labels");
                Vec::new()
            }
        }
    }

    async fn retrieve(&self, search_text: &str) -> Vec<CorpusRecord> {
        let embedding = match self.embedder.embed(search_text).await {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!(error = %e, "embedding failed, answering without context");
                return Vec::new();
            }
        };
        if let Err(e) = ensure_dimension(&embedding, self.embedder.dimension()) {
            warn!(error = %e, "unexpected embedding size, answering without context");
            return Vec::new();
        }

        match self.corpus.search(&embedding, self.settings.top_k).await {
            Ok(mut records) => {
                records.truncate(self.settings.top_k);
                records
            }
            Err(e) => {
                warn!(error = %e, "corpus search failed, answering without context");
                Vec::new()
            }
        }
    }

    async fn history_messages(&self, session_id: &str, prompt: String) -> Vec<ChatMessage> {
        let history = match self.sessions.as_ref() {
            Some(store) => store.get(session_id).await.unwrap_or_else(|e| {
                warn!(error = %e, "session history unavailable");
                Vec::new()
            }),
            None => Vec::new(),
        };
        let mut messages = recent_messages(&history, self.settings.history_turns);
        messages.push(ChatMessage::user(prompt));
        messages
    }

    async fn record_exchange(&self, session_id: &str, seed: &str, image: Option<String>, reply: &str) {
        let Some(store) = self.sessions.as_ref() else {
            return;
        };
        let turns = vec![
            ConversationTurn::user(seed, image),
            ConversationTurn::assistant(reply),
        ];
        if let Err(e) = store.append_all(session_id, turns).await {
            warn!(error = %e, "could not record conversation turns");
        }
    }
}
