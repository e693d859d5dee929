//! Completion request and result types shared by all backends.

use serde::{Deserialize, Serialize};

/// Chat message role on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One entry of a chat-style `messages` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// What gets sent to a completion backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionInput {
    /// A single composed prompt, sent as the user turn.
    Prompt(String),
    /// A full message history ending with the new user turn.
    Messages(Vec<ChatMessage>),
}

impl CompletionInput {
    /// Expand into the wire `messages` array.
    ///
    /// The system message is prepended unless the history already starts with one.
    pub fn into_messages(self, system_prompt: &str) -> Vec<ChatMessage> {
        match self {
            Self::Prompt(prompt) => vec![ChatMessage::system(system_prompt), ChatMessage::user(prompt)],
            Self::Messages(messages) => {
                let has_system = messages
                    .first()
                    .is_some_and(|m| m.role == ChatRole::System);
                if has_system {
                    messages
                } else {
                    let mut out = Vec::with_capacity(messages.len() + 1);
                    out.push(ChatMessage::system(system_prompt));
                    out.extend(messages);
                    out
                }
            }
        }
    }
}

/// Outcome of one completion call. Never retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionResult {
    pub text: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl CompletionResult {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ok: true,
            error_detail: None,
        }
    }

    /// A failed call. An empty detail is replaced so `error_detail` is never blank.
    pub fn failure(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        let detail = if detail.trim().is_empty() {
            "completion failed without further detail".to_string()
        } else {
            detail
        };
        Self {
            text: String::new(),
            ok: false,
            error_detail: Some(detail),
        }
    }
}
