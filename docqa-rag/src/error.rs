//! Error types for the `docqa-rag` crate.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while indexing a document or answering a question.
#[derive(Debug, Error)]
pub enum RagError {
    /// The source document is missing, unreadable, or in an unsupported format.
    #[error("Load error ({path}): {message}")]
    LoadError {
        /// The path that was being loaded.
        path: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
        /// Whether the same request may succeed if retried later.
        retryable: bool,
        /// The input itself was rejected, as opposed to the upstream service failing.
        invalid_input: bool,
    },

    /// The vector index was searched before it was built.
    #[error("Vector index has not been built")]
    EmptyIndexError,

    /// An embedding does not match the dimensionality of the index.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimensionality fixed by the index.
        expected: usize,
        /// Dimensionality of the offending vector.
        actual: usize,
    },

    /// The language model call failed.
    #[error("Synthesis error ({model}): {message}")]
    SynthesisError {
        /// The model that produced the error.
        model: String,
        /// A description of the failure.
        message: String,
    },

    /// A per-query deadline elapsed.
    #[error("Timed out during {stage} after {after:?}")]
    Timeout {
        /// The query stage that was running when the deadline elapsed.
        stage: &'static str,
        /// The configured query budget.
        after: Duration,
    },

    /// The question is empty or otherwise unusable.
    #[error("Invalid question: {0}")]
    InvalidQuestion(String),

    /// The query service has not finished indexing.
    #[error("Query service is not ready")]
    NotReady,

    /// The query service lifecycle was started twice.
    #[error("Query service has already been initialized")]
    AlreadyInitialized,
}

impl RagError {
    /// Create a [`RagError::LoadError`] for the given path.
    pub fn load(path: impl AsRef<std::path::Path>, message: impl Into<String>) -> Self {
        Self::LoadError { path: path.as_ref().display().to_string(), message: message.into() }
    }

    /// Create a non-retryable [`RagError::EmbeddingError`] for malformed input.
    pub fn malformed_input(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EmbeddingError {
            provider: provider.into(),
            message: message.into(),
            retryable: false,
            invalid_input: true,
        }
    }

    /// Create a retryable [`RagError::EmbeddingError`] for a transient upstream failure.
    pub fn upstream_embedding(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EmbeddingError {
            provider: provider.into(),
            message: message.into(),
            retryable: true,
            invalid_input: false,
        }
    }

    /// Whether the request was rejected because of its input, such as an empty
    /// question or text the embedding API refused.
    pub fn is_invalid_input(&self) -> bool {
        match self {
            Self::InvalidQuestion(_) => true,
            Self::EmbeddingError { invalid_input, .. } => *invalid_input,
            _ => false,
        }
    }

    /// Whether the failed operation may succeed if retried later.
    ///
    /// Transient upstream failures and timeouts are retryable. Malformed input,
    /// configuration and lifecycle errors are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::EmbeddingError { retryable, .. } => *retryable,
            Self::SynthesisError { .. } | Self::Timeout { .. } => true,
            _ => false,
        }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryability_follows_error_class() {
        assert!(RagError::upstream_embedding("OpenAI", "503").is_retryable());
        assert!(!RagError::malformed_input("OpenAI", "empty").is_retryable());
        assert!(
            RagError::SynthesisError { model: "m".into(), message: "down".into() }.is_retryable()
        );
        assert!(
            RagError::Timeout { stage: "synthesis", after: Duration::from_secs(1) }.is_retryable()
        );
        assert!(!RagError::EmptyIndexError.is_retryable());
        assert!(!RagError::ConfigError("bad".into()).is_retryable());
        assert!(!RagError::load("missing.pdf", "not found").is_retryable());
    }

    #[test]
    fn only_rejected_input_is_invalid_input() {
        assert!(RagError::malformed_input("OpenAI", "empty").is_invalid_input());
        assert!(RagError::InvalidQuestion("blank".into()).is_invalid_input());
        assert!(!RagError::upstream_embedding("OpenAI", "503").is_invalid_input());
        let unauthorized = RagError::EmbeddingError {
            provider: "OpenAI".into(),
            message: "401".into(),
            retryable: false,
            invalid_input: false,
        };
        assert!(!unauthorized.is_invalid_input());
        assert!(!unauthorized.is_retryable());
    }

    #[test]
    fn load_error_names_the_path() {
        let err = RagError::load("docs/handbook.pdf", "file not found");
        assert_eq!(err.to_string(), "Load error (docs/handbook.pdf): file not found");
    }
}
