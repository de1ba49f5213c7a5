//! In-memory vector index using cosine similarity.
//!
//! [`InMemoryVectorIndex`] keeps entries in insertion order in a `Vec` and
//! scans them on every query, keeping the best `k` in a bounded min-heap.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use tracing::debug;

use crate::document::{IndexEntry, RetrievalResult, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorIndex;

/// An exhaustive in-memory vector index.
///
/// Searching before [`build`](VectorIndex::build) fails with
/// [`RagError::EmptyIndexError`].
#[derive(Debug, Default)]
pub struct InMemoryVectorIndex {
    entries: Vec<IndexEntry>,
    norms: Vec<f32>,
    dimensions: Option<usize>,
    built: bool,
}

impl InMemoryVectorIndex {
    /// Create a new, unbuilt index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an index and build it from `entries` in one step.
    pub fn from_entries(entries: Vec<IndexEntry>) -> Result<Self> {
        let mut index = Self::new();
        index.build(entries)?;
        Ok(index)
    }

    /// The indexed entries in insertion order.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Compute cosine similarity from a dot product and precomputed norms.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine(a: &[f32], norm_a: f32, b: &[f32], norm_b: f32) -> f32 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let score = dot / (norm_a * norm_b);
    if score.is_finite() { score } else { f32::NEG_INFINITY }
}

/// Heap candidate ordered so that "greater" means "ranks higher".
#[derive(Debug)]
struct Candidate {
    score: f32,
    position: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // Higher score first, then earlier insertion.
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.position.cmp(&self.position))
    }
}

impl VectorIndex for InMemoryVectorIndex {
    fn build(&mut self, entries: Vec<IndexEntry>) -> Result<()> {
        let dimensions = entries.first().map(|e| e.embedding.len());
        if let Some(expected) = dimensions {
            if expected == 0 {
                return Err(RagError::DimensionMismatch { expected: 1, actual: 0 });
            }
            if let Some(bad) = entries.iter().find(|e| e.embedding.len() != expected) {
                return Err(RagError::DimensionMismatch {
                    expected,
                    actual: bad.embedding.len(),
                });
            }
        }

        self.norms = entries.iter().map(|e| l2_norm(&e.embedding)).collect();
        self.entries = entries;
        self.dimensions = dimensions;
        self.built = true;
        debug!(entry_count = self.entries.len(), ?dimensions, "built vector index");
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<RetrievalResult> {
        if !self.built {
            return Err(RagError::EmptyIndexError);
        }
        if let Some(expected) = self.dimensions {
            if query.len() != expected {
                return Err(RagError::DimensionMismatch { expected, actual: query.len() });
            }
        }
        if k == 0 || self.entries.is_empty() {
            return Ok(Vec::new());
        }

        let query_norm = l2_norm(query);
        let mut heap: BinaryHeap<Reverse<Candidate>> = BinaryHeap::with_capacity(k + 1);
        for (position, (entry, norm)) in self.entries.iter().zip(&self.norms).enumerate() {
            let score = cosine(&entry.embedding, *norm, query, query_norm);
            heap.push(Reverse(Candidate { score, position }));
            if heap.len() > k {
                heap.pop();
            }
        }

        Ok(heap
            .into_sorted_vec()
            .into_iter()
            .map(|Reverse(c)| SearchResult {
                chunk: self.entries[c.position].chunk.clone(),
                score: c.score,
            })
            .collect())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }
}
