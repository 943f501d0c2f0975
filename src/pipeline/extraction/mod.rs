//! PDF acquisition and text extraction.
//!
//! `resolve_source` decides where a document's content comes from,
//! `fetch` downloads remote PDFs into temp files, `pdf` pulls the text
//! layer out page by page. Extraction failures are recoverable: the
//! orchestrator converts them to fallback summary content. Only a
//! missing source is fatal for the processing attempt.

pub mod fetch;
pub mod pdf;

use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

use crate::models::Document;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("failed to download {url} after {attempts} attempts: {reason}")]
    Download {
        url: String,
        attempts: u32,
        reason: String,
    },

    #[error("failed to parse PDF: {0}")]
    PdfParsing(String),

    #[error("document produced no extractable text")]
    EmptyDocument,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("document {document_id} has neither a readable local file nor a PDF URL")]
    Unavailable { document_id: Uuid },
}

/// Where a document's PDF content comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    Local(PathBuf),
    Remote(String),
}

/// Resolve the content source for a document: a local file that exists
/// on disk wins, otherwise the remote URL.
pub fn resolve_source(document: &Document) -> Result<ContentSource, SourceError> {
    if let Some(path) = &document.local_file {
        let path = PathBuf::from(path);
        if path.is_file() {
            return Ok(ContentSource::Local(path));
        }
        tracing::warn!(
            document_id = %document.id,
            path = %path.display(),
            "Local file missing, falling back to PDF URL"
        );
    }

    if let Some(url) = &document.pdf_url {
        if !url.trim().is_empty() {
            return Ok(ContentSource::Remote(url.clone()));
        }
    }

    Err(SourceError::Unavailable {
        document_id: document.id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn doc_with(pdf_url: Option<&str>, local_file: Option<&str>) -> Document {
        let mut doc = Document::new("Budget", None, Some("placeholder".into()), Uuid::new_v4());
        doc.pdf_url = pdf_url.map(String::from);
        doc.local_file = local_file.map(String::from);
        doc
    }

    #[test]
    fn existing_local_file_preferred_over_url() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"%PDF-1.4").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let doc = doc_with(Some("https://example.com/budget.pdf"), Some(&path));
        let source = resolve_source(&doc).unwrap();
        assert_eq!(source, ContentSource::Local(PathBuf::from(&path)));
    }

    #[test]
    fn missing_local_file_falls_back_to_url() {
        let doc = doc_with(
            Some("https://example.com/budget.pdf"),
            Some("/nonexistent/budget.pdf"),
        );
        let source = resolve_source(&doc).unwrap();
        assert_eq!(
            source,
            ContentSource::Remote("https://example.com/budget.pdf".into())
        );
    }

    #[test]
    fn no_usable_source_is_an_error() {
        let doc = doc_with(None, Some("/nonexistent/budget.pdf"));
        assert!(matches!(
            resolve_source(&doc),
            Err(SourceError::Unavailable { .. })
        ));
    }

    #[test]
    fn blank_url_is_not_usable() {
        let doc = doc_with(Some("   "), None);
        assert!(resolve_source(&doc).is_err());
    }
}
