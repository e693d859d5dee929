//! OpenAI-compatible embedding gateway adapter.
//!
//! Talks to any server exposing `POST {base_url}/embeddings` (text-embeddings
//! inference, vLLM, hosted OpenAI-style APIs). The key is optional because
//! self-hosted servers usually run without one.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::EmbeddingConfig;
use crate::domain::ports::embedding::{EmbeddingInput, EmbeddingOutput, EmbeddingProvider};
use crate::infrastructure::logging::SecretScrubber;

/// Configuration for the OpenAI-compatible embedding provider.
#[derive(Debug, Clone)]
pub struct OpenAiEmbeddingConfig {
    /// Optional bearer key.
    pub api_key: Option<String>,
    /// Base URL, without the `/embeddings` suffix.
    pub base_url: String,
    pub model: String,
    /// Expected embedding dimension.
    pub dimension: usize,
    pub timeout_secs: u64,
    /// Maximum texts per single API request.
    pub max_batch_size: usize,
}

impl Default for OpenAiEmbeddingConfig {
    fn default() -> Self {
        Self::from(&EmbeddingConfig::default())
    }
}

impl From<&EmbeddingConfig> for OpenAiEmbeddingConfig {
    fn from(config: &EmbeddingConfig) -> Self {
        Self {
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            dimension: config.dimension,
            timeout_secs: config.timeout_secs,
            max_batch_size: config.max_batch_size.max(1),
        }
    }
}

/// OpenAI-compatible embedding provider.
pub struct OpenAiEmbeddingProvider {
    config: OpenAiEmbeddingConfig,
    client: reqwest::Client,
}

impl OpenAiEmbeddingProvider {
    pub fn new(config: OpenAiEmbeddingConfig) -> DomainResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DomainError::ValidationFailed(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    async fn call_embeddings_api(&self, texts: Vec<String>) -> DomainResult<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.config.base_url);
        let expected = texts.len();

        let request_body = EmbeddingsRequest {
            model: &self.config.model,
            input: texts,
        };

        let mut request = self.client.post(&url).json(&request_body);
        if let Some(ref key) = self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DomainError::EmbeddingFailed(format!("Embedding API request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::EmbeddingFailed(format!(
                "Embedding API returned {}: {}",
                status,
                SecretScrubber::global().scrub_truncated(&body, 300)
            )));
        }

        let result: EmbeddingsResponse = response.json().await.map_err(|e| {
            DomainError::SerializationError(format!("Failed to parse embedding response: {e}"))
        })?;

        if result.data.len() != expected {
            return Err(DomainError::EmbeddingFailed(format!(
                "Embedding API returned {} vectors for {} inputs",
                result.data.len(),
                expected
            )));
        }

        // Sort by index to maintain input order
        let mut data = result.data;
        data.sort_by_key(|d| d.index);

        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    async fn embed(&self, text: &str) -> DomainResult<Vec<f32>> {
        let results = self.call_embeddings_api(vec![text.to_string()]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::EmbeddingFailed("Empty embedding response".to_string()))
    }

    async fn embed_batch(&self, inputs: &[EmbeddingInput]) -> DomainResult<Vec<EmbeddingOutput>> {
        let mut all_outputs = Vec::with_capacity(inputs.len());

        for chunk in inputs.chunks(self.config.max_batch_size) {
            let texts = chunk.iter().map(|i| i.text.clone()).collect();
            let vectors = self.call_embeddings_api(texts).await?;

            all_outputs.extend(
                chunk
                    .iter()
                    .zip(vectors)
                    .map(|(input, vector)| EmbeddingOutput { id: input.id, vector }),
            );
        }

        Ok(all_outputs)
    }

    fn max_batch_size(&self) -> usize {
        self.config.max_batch_size
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OpenAiEmbeddingConfig::default();
        assert_eq!(config.model, "BAAI/bge-base-en-v1.5");
        assert_eq!(config.dimension, 768);
        assert_eq!(config.max_batch_size, 256);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_trailing_slash_and_blank_key_normalized() {
        let section = EmbeddingConfig {
            base_url: "http://embedder:8080/v1/".to_string(),
            api_key: Some(String::new()),
            ..EmbeddingConfig::default()
        };
        let config = OpenAiEmbeddingConfig::from(&section);
        assert_eq!(config.base_url, "http://embedder:8080/v1");
        assert!(config.api_key.is_none());
    }

    #[tokio::test]
    async fn test_embed_batch_empty_makes_no_request() {
        let provider = OpenAiEmbeddingProvider::new(OpenAiEmbeddingConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..OpenAiEmbeddingConfig::default()
        })
        .unwrap();
        assert!(provider.embed_batch(&[]).await.unwrap().is_empty());
    }
}
