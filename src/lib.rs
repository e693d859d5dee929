//! Larder - retrieval-augmented recipe assistant
//!
//! Larder answers cooking questions from free text and ingredient photos. A
//! request flows through object detection, text embedding, a pgvector
//! similarity search over a recipe corpus and finally an LLM completion
//! grounded in the retrieved recipes.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): models, errors and the ports collaborators implement
//! - **Service Layer** (`services`): prompt composition, request orchestration, indexing
//! - **Adapters** (`adapters`): completion backends, embeddings, Postgres, detection, sessions, HTTP API
//! - **Infrastructure Layer** (`infrastructure`): configuration, logging, composition root
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use larder::infrastructure::{config::ConfigLoader, AppContext};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let ctx = AppContext::build(ConfigLoader::load(None)?).await?;
//!     println!("{}", ctx.orchestrator.answer("something with leeks", None).await);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    Answer, AnswerRequest, CompletionInput, CompletionResult, Config, CorpusRecord, Detection,
    ImageInput, Query,
};
pub use domain::ports::{
    CompletionBackend, CorpusStore, EmbeddingIndex, EmbeddingProvider, ObjectDetector, SessionStore,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{CorpusIndexer, PromptComposer, RetrievalOrchestrator};
