//! Orchestrator request/response envelopes used by the CLI and HTTP API.

use serde::{Deserialize, Serialize};

use super::corpus::CorpusRecord;
use super::query::ImageInput;

/// Everything the orchestrator needs for one request.
#[derive(Debug, Clone, Default)]
pub struct AnswerRequest {
    pub text: String,
    pub image: Option<ImageInput>,
    /// Conversation to continue. Ignored unless sessions are enabled.
    pub session_id: Option<String>,
}

impl AnswerRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_image(mut self, image: ImageInput) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

/// A retrieved recipe cited by an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub id: i64,
    pub name: String,
}

impl From<&CorpusRecord> for SourceRef {
    fn from(record: &CorpusRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
        }
    }
}

/// Final result of the pipeline. `text` is always user-presentable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    /// False only when the completion backend failed.
    pub ok: bool,
    pub detected_labels: Vec<String>,
    pub sources: Vec<SourceRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}
