//! Document loading.
//!
//! [`load_document`] picks a reader from the file extension:
//!
//! - `.pdf`: one page per PDF page, extracted with `lopdf`
//! - `.txt` / `.md`: pages separated by form feed (`\x0c`)
//!
//! Loading has no side effects beyond file reads.

use std::path::Path;

use tracing::{info, warn};

use crate::document::{Document, Page};
use crate::error::{RagError, Result};

/// Page separator recognised in plain-text documents.
pub const FORM_FEED: char = '\x0c';

/// Supported source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// Portable Document Format.
    Pdf,
    /// UTF-8 plain text or markdown.
    Text,
}

impl DocumentFormat {
    /// Detect the format from the path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "txt" | "md" | "markdown" => Some(Self::Text),
            _ => None,
        }
    }
}

/// Load a document into ordered, 1-based pages.
///
/// # Errors
///
/// Returns [`RagError::LoadError`] if the file is missing or unreadable, if the
/// format is not supported, or if no page carries any text.
pub fn load_document(path: impl AsRef<Path>) -> Result<Document> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(RagError::load(path, "file not found"));
    }

    let format = DocumentFormat::from_path(path)
        .ok_or_else(|| RagError::load(path, "unsupported document format"))?;

    let pages = match format {
        DocumentFormat::Pdf => read_pdf_pages(path)?,
        DocumentFormat::Text => {
            let raw = std::fs::read_to_string(path)
                .map_err(|e| RagError::load(path, format!("failed to read file: {e}")))?;
            split_text_pages(&raw)
        }
    };

    let document = Document { source: path.to_path_buf(), pages };
    if document.is_blank() {
        return Err(RagError::load(path, "no extractable text"));
    }

    info!(
        document.path = %path.display(),
        page_count = document.pages.len(),
        char_count = document.char_count(),
        "loaded document"
    );
    Ok(document)
}

/// Split plain text into pages at form feeds.
///
/// A trailing form feed does not open an extra empty page.
pub fn split_text_pages(raw: &str) -> Vec<Page> {
    let mut parts: Vec<&str> = raw.split(FORM_FEED).collect();
    if parts.len() > 1 && parts.last().is_some_and(|p| p.is_empty()) {
        parts.pop();
    }
    parts
        .into_iter()
        .enumerate()
        .map(|(i, text)| Page { number: i + 1, text: text.to_string() })
        .collect()
}

fn read_pdf_pages(path: &Path) -> Result<Vec<Page>> {
    let pdf = lopdf::Document::load(path)
        .map_err(|e| RagError::load(path, format!("failed to parse PDF: {e}")))?;

    let mut pages = Vec::new();
    for (position, (page_number, _)) in pdf.get_pages().into_iter().enumerate() {
        let text = match pdf.extract_text(&[page_number]) {
            Ok(text) => text,
            Err(e) => {
                // Keep the page so numbering stays aligned with the source.
                warn!(document.path = %path.display(), page_number, error = %e, "page has no extractable text");
                String::new()
            }
        };
        pages.push(Page { number: position + 1, text });
    }
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_temp(suffix: &str, contents: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents).unwrap();
        file
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let err = load_document("/definitely/not/here/handbook.pdf").unwrap_err();
        assert!(matches!(err, RagError::LoadError { .. }));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn unsupported_extension_is_a_load_error() {
        let file = write_temp(".docx", b"whatever");
        let err = load_document(file.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported document format"));
    }

    #[test]
    fn text_pages_split_on_form_feed() {
        let file = write_temp(".txt", b"first page\x0csecond page\x0c");
        let doc = load_document(file.path()).unwrap();
        assert_eq!(doc.pages.len(), 2);
        assert_eq!(doc.pages[0], Page { number: 1, text: "first page".into() });
        assert_eq!(doc.pages[1], Page { number: 2, text: "second page".into() });
    }

    #[test]
    fn text_without_form_feed_is_one_page() {
        let pages = split_text_pages("just one page");
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].number, 1);
    }

    #[test]
    fn blank_document_is_rejected() {
        let file = write_temp(".md", b"  \n\x0c\t");
        let err = load_document(file.path()).unwrap_err();
        assert!(err.to_string().contains("no extractable text"));
    }

    #[test]
    fn invalid_utf8_is_a_load_error() {
        let file = write_temp(".txt", &[0xff, 0xfe, 0xfd]);
        assert!(matches!(load_document(file.path()), Err(RagError::LoadError { .. })));
    }

    #[test]
    fn corrupt_pdf_is_a_load_error() {
        let file = write_temp(".pdf", b"%PDF-1.4 this is not really a pdf");
        assert!(matches!(load_document(file.path()), Err(RagError::LoadError { .. })));
    }

    #[test]
    fn format_detection_is_case_insensitive() {
        assert_eq!(DocumentFormat::from_path(Path::new("a/B.PDF")), Some(DocumentFormat::Pdf));
        assert_eq!(DocumentFormat::from_path(Path::new("notes.Md")), Some(DocumentFormat::Text));
        assert_eq!(DocumentFormat::from_path(Path::new("README")), None);
    }
}
