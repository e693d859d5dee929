//! Session store port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::ConversationTurn;

/// Append-only conversation history keyed by session id.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Full stored history for a session, oldest first. Unknown ids yield an empty list.
    async fn get(&self, session_id: &str) -> DomainResult<Vec<ConversationTurn>>;

    /// Append one turn.
    async fn append(&self, session_id: &str, turn: ConversationTurn) -> DomainResult<()>;

    /// Append several turns so that readers observe all of them or none.
    async fn append_all(&self, session_id: &str, turns: Vec<ConversationTurn>) -> DomainResult<()>;
}
