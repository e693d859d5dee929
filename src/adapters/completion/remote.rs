//! Hosted chat completions backend (OpenAI-compatible, bearer auth).

use std::time::Duration;

use async_trait::async_trait;
use governor::DefaultDirectRateLimiter;
use reqwest::{header, Client};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::{
    build_http_client, describe_status, describe_transport_error, rate_limiter,
    read_incrementally,
};
use crate::domain::errors::DomainResult;
use crate::domain::models::{ChatMessage, CompletionConfig, CompletionInput, CompletionResult};
use crate::domain::ports::CompletionBackend;

const BACKEND: &str = "remote";

/// Configuration for the remote completion backend.
#[derive(Debug, Clone)]
pub struct RemoteBackendConfig {
    /// Full chat completions URL.
    pub api_url: String,
    /// Bearer token. Requests are refused locally when absent.
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub presence_penalty: f32,
    pub system_prompt: String,
    /// Whole-request timeout, body included.
    pub timeout: Duration,
    pub requests_per_second: f64,
}

impl Default for RemoteBackendConfig {
    fn default() -> Self {
        Self::from_config(&CompletionConfig::default())
    }
}

impl RemoteBackendConfig {
    pub fn from_config(config: &CompletionConfig) -> Self {
        let remote = &config.remote;
        Self {
            api_url: remote.api_url.clone(),
            api_key: remote.api_key.clone(),
            model: remote.model.clone(),
            max_tokens: remote.max_tokens,
            temperature: remote.temperature,
            top_p: remote.top_p,
            presence_penalty: remote.presence_penalty,
            system_prompt: config.system_prompt.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            requests_per_second: config.requests_per_second,
        }
    }

    /// Create config with explicit API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    presence_penalty: f32,
    stream: bool,
}

/// Buffered remote backend; SSE accumulation when asked to stream.
pub struct RemoteCompletionBackend {
    config: RemoteBackendConfig,
    client: Client,
    limiter: DefaultDirectRateLimiter,
}

impl RemoteCompletionBackend {
    pub fn new(config: RemoteBackendConfig) -> DomainResult<Self> {
        let client = build_http_client(config.timeout)?;
        let limiter = rate_limiter(config.requests_per_second);
        Ok(Self {
            config,
            client,
            limiter,
        })
    }

    fn build_request(&self, input: CompletionInput, stream: bool) -> ChatCompletionRequest<'_> {
        ChatCompletionRequest {
            model: &self.config.model,
            messages: input.into_messages(&self.config.system_prompt),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            top_p: self.config.top_p,
            presence_penalty: self.config.presence_penalty,
            stream,
        }
    }

    async fn send(&self, api_key: &str, input: CompletionInput, stream: bool) -> Result<String, String> {
        let request = self.build_request(input, stream);
        self.limiter.until_ready().await;

        let response = self
            .client
            .post(&self.config.api_url)
            .header(header::AUTHORIZATION, format!("Bearer {api_key}"))
            .header(header::ACCEPT, if stream { "text/event-stream" } else { "application/json" })
            .json(&request)
            .send()
            .await
            .map_err(|e| describe_transport_error(BACKEND, &e, self.config.timeout))?;

        if !response.status().is_success() {
            return Err(describe_status(BACKEND, response).await);
        }

        if stream {
            return read_incrementally(BACKEND, response, self.config.timeout).await;
        }

        let body = response
            .text()
            .await
            .map_err(|e| describe_transport_error(BACKEND, &e, self.config.timeout))?;
        parse_buffered(&body)
    }
}

/// Strict extraction of `choices[0].message.content`. Blank content is a failure.
fn parse_buffered(body: &str) -> Result<String, String> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| format!("remote completion response is not valid JSON: {e}"))?;
    let content = value
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .ok_or_else(|| "remote completion response is missing choices[0].message.content".to_string())?;
    if content.trim().is_empty() {
        return Err("remote completion response has empty choices[0].message.content".to_string());
    }
    Ok(content.to_string())
}

#[async_trait]
impl CompletionBackend for RemoteCompletionBackend {
    fn name(&self) -> &'static str {
        BACKEND
    }

    #[instrument(skip(self, input), fields(backend = BACKEND, model = %self.config.model))]
    async fn complete(&self, input: CompletionInput, stream: bool) -> CompletionResult {
        let Some(api_key) = self.config.api_key() else {
            warn!("remote completion backend has no API key configured");
            return CompletionResult::failure(
                "no API key configured for the remote completion backend",
            );
        };

        match self.send(api_key, input, stream).await {
            Ok(text) => {
                debug!(chars = text.len(), "remote completion succeeded");
                CompletionResult::success(text)
            }
            Err(detail) => CompletionResult::failure(detail),
        }
    }
}
