//! Service layer: prompt assembly, retrieval orchestration, corpus indexing.

pub mod corpus_indexer;
pub mod prompt_composer;
pub mod retrieval_orchestrator;

pub use corpus_indexer::{CorpusIndexer, IndexReport, DEFAULT_BATCH_SIZE};
pub use prompt_composer::PromptComposer;
pub use retrieval_orchestrator::{
    OrchestratorSettings, RetrievalOrchestrator, COMPLETION_FAILED_MESSAGE, NO_INPUT_MESSAGE,
};
