//! Top-k retrieval over a built vector index.

use std::sync::Arc;

use tracing::debug;

use crate::document::RetrievalResult;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::vectorstore::VectorIndex;

/// Turns a question into its ranked supporting chunks.
///
/// Holds no state beyond shared handles to the embedder and the index.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    top_k: usize,
    similarity_threshold: Option<f32>,
}

impl Retriever {
    /// Create a retriever returning at most `top_k` results per question.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `top_k` is zero.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        top_k: usize,
    ) -> Result<Self> {
        if top_k == 0 {
            return Err(RagError::ConfigError("top_k must be greater than zero".to_string()));
        }
        Ok(Self { embedder, index, top_k, similarity_threshold: None })
    }

    /// Drop results scoring below `threshold`.
    pub fn with_similarity_threshold(mut self, threshold: Option<f32>) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    /// The configured result count.
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// The index being searched.
    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    /// Embed `question` and return its nearest chunks, best first.
    ///
    /// # Errors
    ///
    /// Propagates embedding and index errors unchanged.
    pub async fn retrieve(&self, question: &str) -> Result<RetrievalResult> {
        let query_embedding = self.embedder.embed(question).await?;
        let mut results = self.index.search(&query_embedding, self.top_k)?;

        if let Some(threshold) = self.similarity_threshold {
            results.retain(|r| r.score >= threshold);
        }

        debug!(
            result_count = results.len(),
            top_score = results.first().map(|r| r.score),
            "retrieved chunks"
        );
        Ok(results)
    }
}
