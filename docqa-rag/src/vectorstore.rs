//! Vector index trait for nearest-neighbour search over chunk embeddings.

use crate::document::{IndexEntry, RetrievalResult};
use crate::error::Result;

/// A store of [`IndexEntry`]s answering similarity queries.
///
/// The index is written once by [`build`](VectorIndex::build) and read-only
/// afterwards, so shared `search` calls need no locking.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{InMemoryVectorIndex, VectorIndex};
///
/// let mut index = InMemoryVectorIndex::new();
/// index.build(entries)?;
/// let results = index.search(&query_embedding, 4)?;
/// ```
pub trait VectorIndex: Send + Sync {
    /// Replace any prior content with `entries`, keeping their order.
    ///
    /// All embeddings must share one dimensionality.
    fn build(&mut self, entries: Vec<IndexEntry>) -> Result<()>;

    /// Return up to `k` entries most similar to `query`, best first.
    ///
    /// Ties keep insertion order. Fewer than `k` results are returned only
    /// when the index holds fewer than `k` entries.
    fn search(&self, query: &[f32], k: usize) -> Result<RetrievalResult>;

    /// Number of indexed entries.
    fn len(&self) -> usize;

    /// Whether the index holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimensionality fixed by the last build, if any entry was indexed.
    fn dimensions(&self) -> Option<usize>;
}
