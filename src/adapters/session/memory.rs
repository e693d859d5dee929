//! In-process session store.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::domain::errors::DomainResult;
use crate::domain::models::ConversationTurn;
use crate::domain::ports::SessionStore;

type History = Arc<Mutex<VecDeque<ConversationTurn>>>;

/// Bounded per-session history.
///
/// The outer map is only write-locked to create a session; each session has
/// its own mutex, so a batch append is never observed half-done.
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, History>>,
    capacity: usize,
}

impl InMemorySessionStore {
    /// `capacity` is the number of turns kept per session; older turns are dropped.
    pub fn new(capacity: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    async fn history(&self, session_id: &str) -> History {
        if let Some(history) = self.sessions.read().await.get(session_id) {
            return Arc::clone(history);
        }
        let mut sessions = self.sessions.write().await;
        Arc::clone(sessions.entry(session_id.to_string()).or_default())
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, session_id: &str) -> DomainResult<Vec<ConversationTurn>> {
        let history = self.sessions.read().await.get(session_id).cloned();
        match history {
            Some(history) => Ok(history.lock().await.iter().cloned().collect()),
            None => Ok(Vec::new()),
        }
    }

    async fn append(&self, session_id: &str, turn: ConversationTurn) -> DomainResult<()> {
        self.append_all(session_id, vec![turn]).await
    }

    async fn append_all(&self, session_id: &str, turns: Vec<ConversationTurn>) -> DomainResult<()> {
        if turns.is_empty() {
            return Ok(());
        }
        let history = self.history(session_id).await;
        let mut history = history.lock().await;
        history.extend(turns);
        while history.len() > self.capacity {
            history.pop_front();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::TurnRole;

    #[tokio::test]
    async fn test_unknown_session_is_empty() {
        let store = InMemorySessionStore::new(10);
        assert!(store.get("nope").await.unwrap().is_empty());
        assert_eq!(store.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_append_preserves_order() {
        let store = InMemorySessionStore::new(10);
        store.append("s", ConversationTurn::user("hi", None)).await.unwrap();
        store.append("s", ConversationTurn::assistant("hello")).await.unwrap();

        let turns = store.get("s").await.unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, TurnRole::User);
        assert_eq!(turns[1].content, "hello");
    }

    #[tokio::test]
    async fn test_capacity_drops_oldest() {
        let store = InMemorySessionStore::new(3);
        for i in 0..5 {
            store
                .append("s", ConversationTurn::user(format!("turn {i}"), None))
                .await
                .unwrap();
        }
        let turns = store.get("s").await.unwrap();
        let contents: Vec<_> = turns.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["turn 2", "turn 3", "turn 4"]);
    }

    #[tokio::test]
    async fn test_concurrent_batches_never_interleave() {
        let store = Arc::new(InMemorySessionStore::new(1000));
        let writers: Vec<_> = (0..20)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .append_all(
                            "shared",
                            vec![
                                ConversationTurn::user(format!("q{i}"), None),
                                ConversationTurn::assistant(format!("a{i}")),
                            ],
                        )
                        .await
                        .unwrap();
                })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap();
        }

        let turns = store.get("shared").await.unwrap();
        assert_eq!(turns.len(), 40);
        for pair in turns.chunks(2) {
            assert_eq!(pair[0].role, TurnRole::User);
            assert_eq!(pair[1].role, TurnRole::Assistant);
            assert_eq!(pair[0].content[1..], pair[1].content[1..]);
        }
    }
}
