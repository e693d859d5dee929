//! Embedding provider adapters.

#[cfg(feature = "fastembed-engine")]
pub mod fastembed;
pub mod openai;

#[cfg(feature = "fastembed-engine")]
pub use self::fastembed::FastEmbedProvider;
pub use openai::{OpenAiEmbeddingConfig, OpenAiEmbeddingProvider};
