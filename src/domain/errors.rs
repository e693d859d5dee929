//! Domain errors for the Larder retrieval pipeline.

use thiserror::Error;

/// Errors raised by collaborators of the retrieval pipeline.
///
/// Completion failures are not represented here: completion backends report
/// them as a [`CompletionResult`](crate::domain::models::CompletionResult)
/// value so the orchestrator never has to unwind through an error path.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Embedding failed: {0}")]
    EmbeddingFailed(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Corpus store failed: {0}")]
    CorpusStoreFailed(String),

    #[error("Object detection failed: {0}")]
    DetectionFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_mismatch_message() {
        let err = DomainError::DimensionMismatch {
            expected: 768,
            actual: 384,
        };
        assert_eq!(
            err.to_string(),
            "Embedding dimension mismatch: expected 768, got 384"
        );
    }

    #[test]
    fn test_from_serde_json_error() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let domain: DomainError = err.into();
        assert!(matches!(domain, DomainError::SerializationError(_)));
    }
}
