//! PostgreSQL + pgvector adapters.

pub mod connection;
pub mod corpus_store;

pub use connection::{create_lazy_pool, create_pool, verify_connection, ConnectionError};
pub use corpus_store::PgCorpusStore;
