//! Configuration for indexing and answering.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};
use crate::prompt::DEFAULT_REFUSAL_PHRASE;

/// Configuration parameters for the retrieval pipeline and query service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RagConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of top results to return from vector search.
    pub top_k: usize,
    /// Optional minimum similarity score. `None` keeps every search result.
    pub similarity_threshold: Option<f32>,
    /// Phrase the model is instructed to emit when the context is insufficient.
    pub refusal_phrase: String,
    /// Budget for a single query, covering queueing, retrieval and synthesis.
    pub query_timeout: Duration,
    /// Maximum number of queries talking to upstream services at once.
    pub max_concurrent_requests: usize,
    /// Maximum number of embedding batches in flight while indexing.
    pub indexing_concurrency: usize,
    /// Number of chunks sent to the embedding provider per request.
    pub embedding_batch_size: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 50,
            top_k: 4,
            similarity_threshold: None,
            refusal_phrase: DEFAULT_REFUSAL_PHRASE.to_string(),
            query_timeout: Duration::from_secs(60),
            max_concurrent_requests: 8,
            indexing_concurrency: 4,
            embedding_batch_size: 64,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Check that the parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] describing the first invalid parameter.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::ConfigError("chunk_size must be greater than zero".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(RagError::ConfigError("top_k must be greater than zero".to_string()));
        }
        if self.max_concurrent_requests == 0 {
            return Err(RagError::ConfigError(
                "max_concurrent_requests must be greater than zero".to_string(),
            ));
        }
        if self.indexing_concurrency == 0 {
            return Err(RagError::ConfigError(
                "indexing_concurrency must be greater than zero".to_string(),
            ));
        }
        if self.embedding_batch_size == 0 {
            return Err(RagError::ConfigError(
                "embedding_batch_size must be greater than zero".to_string(),
            ));
        }
        if self.refusal_phrase.trim().is_empty() {
            return Err(RagError::ConfigError("refusal_phrase must not be blank".to_string()));
        }
        if self.query_timeout.is_zero() {
            return Err(RagError::ConfigError("query_timeout must be non-zero".to_string()));
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of top results to return from vector search.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Drop search results scoring below `threshold`.
    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = Some(threshold);
        self
    }

    /// Set the refusal phrase used by the grounding prompt.
    pub fn refusal_phrase(mut self, phrase: impl Into<String>) -> Self {
        self.config.refusal_phrase = phrase.into();
        self
    }

    /// Set the per-query timeout.
    pub fn query_timeout(mut self, timeout: Duration) -> Self {
        self.config.query_timeout = timeout;
        self
    }

    /// Set the maximum number of concurrently served queries.
    pub fn max_concurrent_requests(mut self, limit: usize) -> Self {
        self.config.max_concurrent_requests = limit;
        self
    }

    /// Set the number of embedding batches in flight during indexing.
    pub fn indexing_concurrency(mut self, limit: usize) -> Self {
        self.config.indexing_concurrency = limit;
        self
    }

    /// Set the embedding batch size used during indexing.
    pub fn embedding_batch_size(mut self, size: usize) -> Self {
        self.config.embedding_batch_size = size;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if, among others:
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    /// - the refusal phrase is blank
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_reference_deployment() {
        let config = RagConfig::default();
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 50);
        assert_eq!(config.top_k, 4);
        assert_eq!(config.similarity_threshold, None);
        assert_eq!(config.refusal_phrase, "Sorry I don't know the answer");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk_size() {
        let err = RagConfig::builder().chunk_size(100).chunk_overlap(100).build().unwrap_err();
        assert!(matches!(err, RagError::ConfigError(_)));
        assert!(err.to_string().contains("chunk_overlap (100)"));
    }

    #[test]
    fn zero_limits_are_rejected() {
        assert!(RagConfig::builder().top_k(0).build().is_err());
        assert!(RagConfig::builder().chunk_size(0).chunk_overlap(0).build().is_err());
        assert!(RagConfig::builder().max_concurrent_requests(0).build().is_err());
        assert!(RagConfig::builder().indexing_concurrency(0).build().is_err());
        assert!(RagConfig::builder().embedding_batch_size(0).build().is_err());
        assert!(RagConfig::builder().query_timeout(Duration::ZERO).build().is_err());
    }

    #[test]
    fn blank_refusal_phrase_is_rejected() {
        assert!(RagConfig::builder().refusal_phrase("   ").build().is_err());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: RagConfig = serde_json::from_str(r#"{"chunk_size": 400, "top_k": 2}"#).unwrap();
        assert_eq!(config.chunk_size, 400);
        assert_eq!(config.top_k, 2);
        assert_eq!(config.chunk_overlap, 50);
    }
}
