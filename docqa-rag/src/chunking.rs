//! Document chunking.
//!
//! This module provides the [`Chunker`] trait and [`FixedSizeChunker`], a
//! sliding character window with a fixed overlap between neighbours.

use crate::config::RagConfig;
use crate::document::{Chunk, Document};
use crate::error::{RagError, Result};

/// A strategy for splitting documents into chunks.
pub trait Chunker: Send + Sync {
    /// Split a document into ordered chunks.
    ///
    /// Returns an empty `Vec` if the document has no text.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Splits text into fixed-size windows by character count with configurable overlap.
///
/// Pages are concatenated in order and the window slides across page
/// boundaries. The window advances by `chunk_size - chunk_overlap` until it
/// reaches the end of the text, so every chunk except the last is exactly
/// `chunk_size` characters and consecutive chunks share exactly
/// `chunk_overlap` characters. Each chunk is attributed to the page holding
/// most of its characters, the earlier page winning ties.
///
/// # Example
///
/// ```rust
/// use docqa_rag::{Chunker, Document, FixedSizeChunker};
///
/// let chunker = FixedSizeChunker::new(10, 3).unwrap();
/// let document = Document::from_pages("notes.txt", ["abcdefghijklmnop"]);
/// let chunks = chunker.chunk(&document);
/// assert_eq!(chunks[0].text, "abcdefghij");
/// assert_eq!(chunks[1].text, "hijklmnop");
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of characters per chunk
    /// * `chunk_overlap`: number of overlapping characters between consecutive chunks
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_overlap >= chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self { chunk_size, chunk_overlap })
    }

    /// Create a chunker from the chunking fields of a [`RagConfig`].
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Maximum characters per chunk.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Characters shared by consecutive chunks.
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }
}

/// Character span of one page within the concatenated text.
struct PageSpan {
    number: usize,
    start: usize,
    end: usize,
}

fn page_spans(document: &Document) -> Vec<PageSpan> {
    let mut offset = 0;
    document
        .pages
        .iter()
        .map(|page| {
            let start = offset;
            offset += page.text.chars().count();
            PageSpan { number: page.number, start, end: offset }
        })
        .collect()
}

/// The page holding the most characters of `[start, end)`.
fn dominant_page(spans: &[PageSpan], start: usize, end: usize) -> usize {
    let first = spans.partition_point(|s| s.end <= start);
    let mut best: Option<(usize, usize)> = None;
    for span in spans[first..].iter().take_while(|s| s.start < end) {
        let shared = span.end.min(end).saturating_sub(span.start.max(start));
        if best.is_none_or(|(_, most)| shared > most) {
            best = Some((span.number, shared));
        }
    }
    best.map(|(number, _)| number).unwrap_or(1)
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        let chars: Vec<char> = document.pages.iter().flat_map(|p| p.text.chars()).collect();
        if chars.is_empty() {
            return Vec::new();
        }

        let spans = page_spans(document);
        let step = self.chunk_size - self.chunk_overlap;
        let mut chunks = Vec::new();
        let mut start = 0;

        loop {
            let end = (start + self.chunk_size).min(chars.len());
            let index = chunks.len();
            chunks.push(Chunk {
                index,
                text: chars[start..end].iter().collect(),
                page: dominant_page(&spans, start, end),
                start,
                end,
                overlap: if index == 0 { 0 } else { self.chunk_overlap },
            });

            if end == chars.len() {
                break;
            }
            start += step;
        }

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk_text(text: &str, size: usize, overlap: usize) -> Vec<Chunk> {
        let document = Document::from_pages("test.txt", [text]);
        FixedSizeChunker::new(size, overlap).unwrap().chunk(&document)
    }

    #[test]
    fn overlap_equal_to_size_is_rejected() {
        let err = FixedSizeChunker::new(50, 50).unwrap_err();
        assert!(matches!(err, RagError::ConfigError(_)));
        assert!(FixedSizeChunker::new(50, 51).is_err());
    }

    #[test]
    fn empty_document_yields_no_chunks() {
        assert!(chunk_text("", 10, 2).is_empty());
        let document = Document::from_pages("empty.txt", ["", ""]);
        assert!(FixedSizeChunker::new(10, 2).unwrap().chunk(&document).is_empty());
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunks = chunk_text("short", 10, 2);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "short");
        assert_eq!(chunks[0].overlap, 0);
        assert_eq!((chunks[0].start, chunks[0].end), (0, 5));
    }

    #[test]
    fn window_slides_by_size_minus_overlap() {
        let chunks = chunk_text("0123456789abcdefghij", 8, 3);
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, ["01234567", "56789abc", "abcdefgh", "fghij"]);
        assert!(chunks[1..].iter().all(|c| c.overlap == 3));
    }

    #[test]
    fn text_of_exactly_chunk_size_is_not_repeated() {
        let chunks = chunk_text("0123456789", 10, 4);
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn multibyte_text_is_split_on_characters() {
        let chunks = chunk_text("ааааббббвввв", 5, 1);
        assert!(chunks.iter().all(|c| c.text.chars().count() <= 5));
        assert_eq!(chunks[0].text, "ааааб");
        assert_eq!(chunks[1].overlap_prefix(), "б");
    }

    #[test]
    fn chunks_take_the_page_holding_most_of_their_text() {
        // page 1: 4 chars, page 2: 12 chars
        let document = Document::from_pages("book.txt", ["aaaa", "bbbbbbbbbbbb"]);
        let chunks = FixedSizeChunker::new(6, 1).unwrap().chunk(&document);
        assert_eq!(chunks[0].text, "aaaabb");
        assert_eq!(chunks[0].page, 1);
        assert_eq!(chunks[1].page, 2);
        assert!(chunks.iter().skip(1).all(|c| c.page == 2));
    }

    #[test]
    fn page_ties_go_to_the_earlier_page() {
        let document = Document::from_pages("book.txt", ["aaa", "bbb"]);
        let chunks = FixedSizeChunker::new(6, 0).unwrap().chunk(&document);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].page, 1);
    }

    #[test]
    fn empty_pages_never_own_a_chunk() {
        let document = Document::from_pages("book.txt", ["", "abcdef", "", "ghijkl"]);
        let chunks = FixedSizeChunker::new(6, 0).unwrap().chunk(&document);
        assert_eq!(chunks.iter().map(|c| c.page).collect::<Vec<_>>(), [2, 4]);
    }
}
