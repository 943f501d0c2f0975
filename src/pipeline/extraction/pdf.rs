//! PDF text-layer extraction with boilerplate suppression.
//!
//! Pages are extracted independently: a page that fails to parse is
//! logged and skipped, the rest of the document still yields text.
//! Table-of-contents pages and TOC-shaped lines are dropped before the
//! text reaches the relevance filter.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::ExtractionError;
use crate::pipeline::truncate_chars;

/// A page with more lines than this where every line is short is
/// treated as a table of contents and skipped whole.
const TOC_PAGE_MIN_LINES: usize = 20;
const TOC_PAGE_MAX_LINE_CHARS: usize = 50;

/// Short lines carrying ellipsis runs or trailing page numbers are TOC
/// entries; longer lines with the same shape are kept.
const BOILERPLATE_LINE_MAX_CHARS: usize = 100;

/// Numbered section heading with a dot leader and page number,
/// e.g. "2.1 Social Services .... 14".
static TOC_ENTRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+(\.\d+)?\s+.*\s+\.+\s+\d+$").expect("valid regex"));

static TRAILING_PAGE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+\d+$").expect("valid regex"));

/// Extraction knobs.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    pub max_pages: usize,
    pub max_chars: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            max_pages: 10,
            max_chars: 10_000,
        }
    }
}

/// Extract the text layer of a PDF, page by page.
pub fn extract_text(path: &Path, config: &ExtractConfig) -> Result<String, ExtractionError> {
    let document =
        lopdf::Document::load(path).map_err(|e| ExtractionError::PdfParsing(e.to_string()))?;

    let pages = document.get_pages();
    if pages.is_empty() {
        return Err(ExtractionError::EmptyDocument);
    }
    tracing::info!(path = %path.display(), pages = pages.len(), "Extracting PDF text");

    let mut text = String::new();
    for &page_number in pages.keys().take(config.max_pages) {
        let page_text = match document.extract_text(&[page_number]) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(page = page_number, error = %e, "Skipping unreadable page");
                continue;
            }
        };

        match filter_page_text(&page_text) {
            Some(filtered) => {
                text.push_str(&filtered);
                text.push('\n');
            }
            None => {
                tracing::info!(page = page_number, "Skipping page (likely table of contents)");
            }
        }
    }

    let text = truncate_chars(&text, config.max_chars);
    if text.trim().is_empty() {
        return Err(ExtractionError::EmptyDocument);
    }

    tracing::info!(chars = text.len(), "Extracted PDF text");
    Ok(text.to_string())
}

/// Strip boilerplate from one page's text.
///
/// Returns `None` when the page as a whole looks like a table of
/// contents; otherwise the page text with TOC-shaped lines removed
/// (which may be empty).
pub fn filter_page_text(page_text: &str) -> Option<String> {
    let lines: Vec<&str> = page_text.lines().collect();

    let longest = lines.iter().map(|l| l.trim().len()).max().unwrap_or(0);
    if lines.len() > TOC_PAGE_MIN_LINES && longest < TOC_PAGE_MAX_LINE_CHARS {
        return None;
    }

    let kept: Vec<&str> = lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty() && !is_boilerplate_line(l))
        .collect();

    Some(kept.join("\n"))
}

fn is_boilerplate_line(line: &str) -> bool {
    if TOC_ENTRY_RE.is_match(line) {
        return true;
    }
    if line.contains("...") && line.len() < BOILERPLATE_LINE_MAX_CHARS {
        return true;
    }
    if TRAILING_PAGE_NUMBER_RE.is_match(line) && line.len() < BOILERPLATE_LINE_MAX_CHARS {
        return true;
    }
    false
}
