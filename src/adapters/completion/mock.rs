//! Scripted completion backend for tests and offline runs.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::models::{CompletionInput, CompletionResult};
use crate::domain::ports::CompletionBackend;

/// Returns queued results in order, then the default result.
#[derive(Clone)]
pub struct MockCompletionBackend {
    script: Arc<Mutex<VecDeque<CompletionResult>>>,
    default_result: CompletionResult,
    calls: Arc<Mutex<Vec<(CompletionInput, bool)>>>,
}

impl MockCompletionBackend {
    pub fn new() -> Self {
        Self::with_default(CompletionResult::success("Mock recipe suggestion."))
    }

    pub fn with_default(default_result: CompletionResult) -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            default_result,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always fail with `detail`.
    pub fn failing(detail: impl Into<String>) -> Self {
        Self::with_default(CompletionResult::failure(detail))
    }

    /// Queue a result for the next call.
    pub async fn push(&self, result: CompletionResult) {
        self.script.lock().await.push_back(result);
    }

    /// Inputs received so far, with their stream flag.
    pub async fn calls(&self) -> Vec<(CompletionInput, bool)> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }
}

impl Default for MockCompletionBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionBackend for MockCompletionBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn complete(&self, input: CompletionInput, stream: bool) -> CompletionResult {
        self.calls.lock().await.push((input, stream));
        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| self.default_result.clone())
    }
}
