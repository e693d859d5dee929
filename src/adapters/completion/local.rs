//! Self-hosted chat backend (Ollama-style), read incrementally.

use std::time::Duration;

use async_trait::async_trait;
use governor::DefaultDirectRateLimiter;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, instrument};

use super::{
    build_http_client, describe_status, describe_transport_error, rate_limiter,
    read_incrementally,
};
use crate::domain::errors::DomainResult;
use crate::domain::models::{ChatMessage, CompletionConfig, CompletionInput, CompletionResult};
use crate::domain::ports::CompletionBackend;

const BACKEND: &str = "local";

/// Configuration for the local completion backend.
#[derive(Debug, Clone)]
pub struct LocalBackendConfig {
    pub url: String,
    pub model: String,
    pub system_prompt: String,
    /// Whole-request timeout, body streaming included.
    pub timeout: Duration,
    pub requests_per_second: f64,
}

impl Default for LocalBackendConfig {
    fn default() -> Self {
        Self::from_config(&CompletionConfig::default())
    }
}

impl LocalBackendConfig {
    pub fn from_config(config: &CompletionConfig) -> Self {
        Self {
            url: config.local.url.clone(),
            model: config.local.model.clone(),
            system_prompt: config.system_prompt.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            requests_per_second: config.requests_per_second,
        }
    }
}

#[derive(Debug, Serialize)]
struct LocalChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
}

/// Local backend. Whatever the `stream` flag, the body is consumed chunk by
/// chunk and may be SSE frames, NDJSON or a single JSON object.
pub struct LocalCompletionBackend {
    config: LocalBackendConfig,
    client: Client,
    limiter: DefaultDirectRateLimiter,
}

impl LocalCompletionBackend {
    pub fn new(config: LocalBackendConfig) -> DomainResult<Self> {
        let client = build_http_client(config.timeout)?;
        let limiter = rate_limiter(config.requests_per_second);
        Ok(Self {
            config,
            client,
            limiter,
        })
    }

    async fn send(&self, input: CompletionInput, stream: bool) -> Result<String, String> {
        let request = LocalChatRequest {
            model: &self.config.model,
            messages: input.into_messages(&self.config.system_prompt),
            stream,
        };
        self.limiter.until_ready().await;

        let response = self
            .client
            .post(&self.config.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| describe_transport_error(BACKEND, &e, self.config.timeout))?;

        if !response.status().is_success() {
            return Err(describe_status(BACKEND, response).await);
        }

        read_incrementally(BACKEND, response, self.config.timeout).await
    }
}

#[async_trait]
impl CompletionBackend for LocalCompletionBackend {
    fn name(&self) -> &'static str {
        BACKEND
    }

    #[instrument(skip(self, input), fields(backend = BACKEND, model = %self.config.model))]
    async fn complete(&self, input: CompletionInput, stream: bool) -> CompletionResult {
        match self.send(input, stream).await {
            Ok(text) => {
                debug!(chars = text.len(), "local completion succeeded");
                CompletionResult::success(text)
            }
            Err(detail) => CompletionResult::failure(detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_has_no_sampling_parameters() {
        let request = LocalChatRequest {
            model: "llama3.1",
            messages: CompletionInput::Prompt("hi".to_string()).into_messages("sys"),
            stream: true,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "llama3.1");
        assert_eq!(json["stream"], true);
        assert!(json.get("temperature").is_none());
        assert_eq!(json["messages"].as_array().unwrap().len(), 2);
    }
}
