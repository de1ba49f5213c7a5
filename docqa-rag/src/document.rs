//! Data types for documents, chunks, index entries, and answers.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One logical page of a loaded document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number.
    pub number: usize,
    /// Extracted page text.
    pub text: String,
}

/// A loaded source document: ordered pages with their locators.
///
/// Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    /// Where the document was loaded from.
    pub source: PathBuf,
    /// Pages in original order.
    pub pages: Vec<Page>,
}

impl Document {
    /// Create a document from page texts, numbering pages from 1.
    pub fn from_pages<I, S>(source: impl Into<PathBuf>, pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pages = pages
            .into_iter()
            .enumerate()
            .map(|(i, text)| Page { number: i + 1, text: text.into() })
            .collect();
        Self { source: source.into(), pages }
    }

    /// The page texts concatenated in order, without separators.
    pub fn text(&self) -> String {
        self.pages.iter().map(|p| p.text.as_str()).collect()
    }

    /// Total length of the document in characters.
    pub fn char_count(&self) -> usize {
        self.pages.iter().map(|p| p.text.chars().count()).sum()
    }

    /// Whether no page carries any non-whitespace text.
    pub fn is_blank(&self) -> bool {
        self.pages.iter().all(|p| p.text.trim().is_empty())
    }
}

/// A bounded retrieval unit cut from the document text.
///
/// Offsets are character (not byte) positions into [`Document::text`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// 0-based position of the chunk in the chunk sequence.
    pub index: usize,
    /// The chunk text.
    pub text: String,
    /// Page holding most of this chunk's characters.
    pub page: usize,
    /// Start character offset (inclusive).
    pub start: usize,
    /// End character offset (exclusive).
    pub end: usize,
    /// Number of leading characters shared with the previous chunk.
    pub overlap: usize,
}

impl Chunk {
    /// The leading characters shared with the previous chunk.
    pub fn overlap_prefix(&self) -> &str {
        match self.text.char_indices().nth(self.overlap) {
            Some((byte, _)) => &self.text[..byte],
            None => &self.text,
        }
    }

    /// The part of the chunk not shared with the previous chunk.
    pub fn fresh_text(&self) -> &str {
        &self.text[self.overlap_prefix().len()..]
    }

    /// Chunk length in characters.
    pub fn char_len(&self) -> usize {
        self.end - self.start
    }
}

/// A chunk paired with its embedding. Owned by the vector index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexEntry {
    /// The indexed chunk.
    pub chunk: Chunk,
    /// The chunk's embedding vector.
    pub embedding: Vec<f32>,
}

/// A retrieved [`Chunk`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The similarity score (higher is more relevant).
    pub score: f32,
}

/// Ranked search results, best first, at most `top_k` long.
pub type RetrievalResult = Vec<SearchResult>;

/// A synthesized answer together with the evidence used to produce it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Answer {
    /// The question that was asked.
    pub query: String,
    /// The model output, verbatim.
    pub result: String,
    /// The retrieval result placed in the prompt context.
    pub sources: RetrievalResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str, overlap: usize) -> Chunk {
        let len = text.chars().count();
        Chunk { index: 1, text: text.to_string(), page: 1, start: 10, end: 10 + len, overlap }
    }

    #[test]
    fn overlap_prefix_counts_characters_not_bytes() {
        let c = chunk("héllo wörld", 3);
        assert_eq!(c.overlap_prefix(), "hél");
        assert_eq!(c.fresh_text(), "lo wörld");
    }

    #[test]
    fn zero_overlap_has_empty_prefix() {
        let c = chunk("abc", 0);
        assert_eq!(c.overlap_prefix(), "");
        assert_eq!(c.fresh_text(), "abc");
    }

    #[test]
    fn document_text_concatenates_pages_in_order() {
        let doc = Document::from_pages("handbook.txt", ["one ", "two ", "three"]);
        assert_eq!(doc.text(), "one two three");
        assert_eq!(doc.char_count(), 13);
        assert_eq!(doc.pages[2].number, 3);
        assert!(!doc.is_blank());
        assert!(Document::from_pages("blank.txt", ["  ", "\n"]).is_blank());
    }
}
