//! Offline embedding provider based on feature hashing.
//!
//! [`HashingEmbeddingProvider`] maps text to a bag-of-words vector: each
//! lower-cased alphanumeric token (minus a short stopword list) is hashed with
//! FNV-1a into one of `dimensions` buckets, and the bucket counts are
//! L2-normalised. It needs no network access and is fully deterministic,
//! which makes it suitable for offline runs and tests. Retrieval quality is
//! lexical, not semantic.

use async_trait::async_trait;

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

const PROVIDER: &str = "Hashing";

/// Default number of hash buckets.
pub const DEFAULT_HASHING_DIMENSIONS: usize = 1024;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "can", "do", "does", "for", "from", "how",
    "i", "in", "is", "it", "of", "on", "or", "that", "the", "this", "to", "was", "what", "when",
    "where", "which", "who", "why", "will", "with", "you",
];

/// Deterministic bag-of-words embeddings with no external service.
#[derive(Debug, Clone)]
pub struct HashingEmbeddingProvider {
    dimensions: usize,
}

impl HashingEmbeddingProvider {
    /// Create a provider producing vectors with `dimensions` components.
    ///
    /// A dimensionality of zero is bumped to one.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions: dimensions.max(1) }
    }

    fn bucket(&self, token: &str) -> usize {
        let hash = token
            .bytes()
            .fold(FNV_OFFSET, |acc, b| (acc ^ u64::from(b)).wrapping_mul(FNV_PRIME));
        (hash % self.dimensions as u64) as usize
    }
}

impl Default for HashingEmbeddingProvider {
    fn default() -> Self {
        Self::new(DEFAULT_HASHING_DIMENSIONS)
    }
}

/// Lower-cased alphanumeric tokens of `text`, stopwords removed.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .filter(|t| !STOPWORDS.contains(&t.as_str()))
}

#[async_trait]
impl EmbeddingProvider for HashingEmbeddingProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(RagError::malformed_input(PROVIDER, "input text must not be empty"));
        }

        let mut embedding = vec![0.0f32; self.dimensions];
        for token in tokenize(text) {
            embedding[self.bucket(&token)] += 1.0;
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            embedding.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
