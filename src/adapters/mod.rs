//! Adapters for external systems.

pub mod completion;
pub mod detection;
pub mod embeddings;
pub mod http;
pub mod postgres;
pub mod session;
