//! Conversation turns kept per chat session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::completion::ChatMessage;

/// Who spoke a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One message in a session's history. Appended, never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub content: String,
    /// Reference to an uploaded image (its file name), user turns only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>, image: Option<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
            image,
            created_at: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
            image: None,
            created_at: Utc::now(),
        }
    }

    pub fn to_message(&self) -> ChatMessage {
        match self.role {
            TurnRole::User => ChatMessage::user(self.content.clone()),
            TurnRole::Assistant => ChatMessage::assistant(self.content.clone()),
        }
    }
}

/// The most recent `limit` turns of `history`, oldest first, as chat messages.
///
/// A turn is one message, not a user/assistant pair. With an odd limit the
/// window usually opens on an assistant reply whose user turn was cut off.
pub fn recent_messages(history: &[ConversationTurn], limit: usize) -> Vec<ChatMessage> {
    let start = history.len().saturating_sub(limit);
    history[start..].iter().map(ConversationTurn::to_message).collect()
}
