//! Offline indexing pipeline.
//!
//! The [`IndexingPipeline`] runs the one-time startup sequence
//! chunk → embed → build for a loaded [`Document`], producing an
//! immutable [`InMemoryVectorIndex`].
//!
//! # Example
//!
//! ```rust,ignore
//! use docqa_rag::{HashingEmbeddingProvider, IndexingPipeline, RagConfig, load_document};
//!
//! let pipeline = IndexingPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(HashingEmbeddingProvider::default()))
//!     .build()?;
//!
//! let document = load_document("docs/handbook.pdf")?;
//! let index = pipeline.index(&document).await?;
//! ```

use std::sync::Arc;

use futures::{StreamExt, TryStreamExt, stream};
use tracing::{debug, error, info};

use crate::chunking::{Chunker, FixedSizeChunker};
use crate::config::RagConfig;
use crate::document::{Chunk, Document, IndexEntry};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::inmemory::InMemoryVectorIndex;
use crate::retry::RetryPolicy;
use crate::vectorstore::VectorIndex;

/// The indexing pipeline.
///
/// Embedding batches run concurrently, at most
/// [`RagConfig::indexing_concurrency`] at a time, and are reassembled in
/// chunk order, so the built index is identical to a sequential run.
/// Construct one via [`IndexingPipeline::builder()`].
pub struct IndexingPipeline {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    chunker: Arc<dyn Chunker>,
    retry: RetryPolicy,
}

impl IndexingPipeline {
    /// Create a new [`IndexingPipelineBuilder`].
    pub fn builder() -> IndexingPipelineBuilder {
        IndexingPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    /// Split the document into chunks.
    pub fn chunk(&self, document: &Document) -> Vec<Chunk> {
        self.chunker.chunk(document)
    }

    /// Embed every chunk, keeping chunk order.
    ///
    /// Chunks made only of whitespace are kept, with a zero vector of the
    /// provider's dimensionality, so the index still covers the whole text.
    ///
    /// # Errors
    ///
    /// Returns the first embedding error once retries are exhausted, or
    /// [`RagError::EmbeddingError`] if the provider returns the wrong number
    /// of vectors for a batch.
    pub async fn embed_chunks(&self, chunks: Vec<Chunk>) -> Result<Vec<IndexEntry>> {
        let batch_size = self.config.embedding_batch_size;
        let batches: Vec<Vec<Chunk>> = chunks.chunks(batch_size).map(<[Chunk]>::to_vec).collect();
        let batch_count = batches.len();

        let embedded: Vec<Vec<IndexEntry>> = stream::iter(batches.into_iter().enumerate())
            .map(|(batch_index, batch)| self.embed_batch(batch_index, batch_count, batch))
            .buffered(self.config.indexing_concurrency)
            .try_collect()
            .await?;

        Ok(embedded.into_iter().flatten().collect())
    }

    async fn embed_batch(
        &self,
        batch_index: usize,
        batch_count: usize,
        batch: Vec<Chunk>,
    ) -> Result<Vec<IndexEntry>> {
        // Whitespace-only chunks carry no signal and embedders reject them.
        let texts: Vec<&str> = batch
            .iter()
            .map(|c| c.text.as_str())
            .filter(|t| !t.trim().is_empty())
            .collect();
        let embeddings = if texts.is_empty() {
            Vec::new()
        } else {
            self.retry
                .run("embed_batch", || self.embedding_provider.embed_batch(&texts))
                .await
                .map_err(|e| {
                    error!(batch_index, error = %e, "embedding failed during indexing");
                    e
                })?
        };

        if embeddings.len() != texts.len() {
            return Err(RagError::EmbeddingError {
                provider: self.embedding_provider.name().to_string(),
                message: format!(
                    "expected {} embeddings for batch {batch_index}, got {}",
                    texts.len(),
                    embeddings.len()
                ),
                retryable: false,
                invalid_input: false,
            });
        }

        let blank = batch.len() - texts.len();
        debug!(batch_index, batch_count, batch_size = batch.len(), blank, "embedded batch");

        let dimensions = self.embedding_provider.dimensions();
        let mut embeddings = embeddings.into_iter();
        let mut entries = Vec::with_capacity(batch.len());
        for chunk in batch {
            let embedding = if chunk.text.trim().is_empty() {
                vec![0.0; dimensions]
            } else {
                embeddings.next().ok_or_else(|| RagError::EmbeddingError {
                    provider: self.embedding_provider.name().to_string(),
                    message: format!("missing embedding in batch {batch_index}"),
                    retryable: false,
                    invalid_input: false,
                })?
            };
            entries.push(IndexEntry { chunk, embedding });
        }
        Ok(entries)
    }

    /// Run chunk → embed → build for `document`.
    ///
    /// # Errors
    ///
    /// Propagates embedding errors and index build errors (for example a
    /// provider returning vectors of inconsistent dimensionality).
    pub async fn index(&self, document: &Document) -> Result<InMemoryVectorIndex> {
        let chunks = self.chunk(document);
        let chunk_count = chunks.len();
        info!(
            document.path = %document.source.display(),
            chunk_count,
            chunk_size = self.config.chunk_size,
            chunk_overlap = self.config.chunk_overlap,
            "chunked document"
        );

        let entries = self.embed_chunks(chunks).await?;
        let index = InMemoryVectorIndex::from_entries(entries)?;

        info!(
            document.path = %document.source.display(),
            chunk_count,
            dimensions = ?index.dimensions(),
            "indexed document"
        );
        Ok(index)
    }
}

/// Builder for constructing an [`IndexingPipeline`].
///
/// `config` and `embedding_provider` are required. The chunker defaults to a
/// [`FixedSizeChunker`] built from the config, and the retry policy to
/// [`RetryPolicy::default()`].
#[derive(Default)]
pub struct IndexingPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    chunker: Option<Arc<dyn Chunker>>,
    retry: Option<RetryPolicy>,
}

impl IndexingPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Override the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Override the retry policy for embedding batches.
    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Build the [`IndexingPipeline`], validating the config and required fields.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if a required field is missing or the
    /// config is invalid.
    pub fn build(self) -> Result<IndexingPipeline> {
        let config =
            self.config.ok_or_else(|| RagError::ConfigError("config is required".to_string()))?;
        config.validate()?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let chunker = match self.chunker {
            Some(chunker) => chunker,
            None => Arc::new(FixedSizeChunker::from_config(&config)?),
        };

        Ok(IndexingPipeline {
            config,
            embedding_provider,
            chunker,
            retry: self.retry.unwrap_or_default(),
        })
    }
}
