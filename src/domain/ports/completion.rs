//! Completion backend port - interface for language-model backends.

use async_trait::async_trait;

use crate::domain::models::{CompletionInput, CompletionResult};

/// A language-model backend that turns a prompt or message history into text.
///
/// Backends never return an error. Transport failures, non-2xx statuses,
/// timeouts and unparseable bodies all come back as a [`CompletionResult`]
/// with `ok == false` and a non-empty `error_detail`. One call makes at most
/// one outgoing request.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Backend name as used in configuration.
    fn name(&self) -> &'static str;

    /// Run one completion. With `stream` set the backend asks for
    /// incremental delivery and accumulates it before returning.
    async fn complete(&self, input: CompletionInput, stream: bool) -> CompletionResult;
}
