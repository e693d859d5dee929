//! Domain models for the retrieval pipeline.

pub mod answer;
pub mod completion;
pub mod config;
pub mod conversation;
pub mod corpus;
pub mod query;

pub use answer::{Answer, AnswerRequest, SourceRef};
pub use completion::{ChatMessage, ChatRole, CompletionInput, CompletionResult};
pub use config::{
    CompletionConfig, Config, DatabaseConfig, DetectionConfig, EmbeddingConfig,
    LocalCompletionConfig, LoggingConfig, RemoteCompletionConfig, RetrievalConfig, ServerConfig,
    SessionConfig,
};
pub use conversation::{recent_messages, ConversationTurn, TurnRole};
pub use corpus::{CorpusRecord, PendingRecord, RetrievedSet};
pub use query::{labels_from_detections, Detection, ImageInput, Query};
