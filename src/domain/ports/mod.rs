//! Port trait definitions (Hexagonal Architecture)
//!
//! Async interfaces the retrieval pipeline depends on:
//! - CompletionBackend: language-model completions
//! - EmbeddingProvider: text to vector
//! - CorpusStore / EmbeddingIndex: pgvector search and ingestion
//! - ObjectDetector: image to food labels
//! - SessionStore: conversation history

pub mod completion;
pub mod corpus_store;
pub mod detection;
pub mod embedding;
pub mod session_store;

pub use completion::CompletionBackend;
pub use corpus_store::{CorpusStore, EmbeddingIndex};
pub use detection::ObjectDetector;
pub use embedding::{ensure_dimension, EmbeddingInput, EmbeddingOutput, EmbeddingProvider};
pub use session_store::SessionStore;
