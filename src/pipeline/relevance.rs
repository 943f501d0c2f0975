//! SDG 5 / SDG 10 relevance filter.
//!
//! Pure text selection; no I/O. Paragraphs mentioning the
//! gender-equality / inequality-reduction vocabulary are kept,
//! boilerplate-shaped paragraphs dropped, and the result capped so
//! downstream generation cost stays bounded.

use std::sync::LazyLock;

use regex::Regex;

use super::truncate_chars;

/// Keyword vocabulary for gender equality and reduced inequalities.
pub const SDG_KEYWORDS: &[&str] = &[
    "gender",
    "women",
    "girls",
    "female",
    "maternal",
    "gender-based violence",
    "gender equality",
    "gender parity",
    "inequality",
    "equity",
    "disparity",
    "marginalized",
    "vulnerable",
    "inclusion",
    "inclusive",
    "discrimination",
    "minority",
    "differently abled",
    "disabilities",
    "equal opportunity",
];

/// Paragraphs shorter than this are headings or TOC fragments.
const MIN_PARAGRAPH_CHARS: usize = 50;

/// Cap on the returned excerpt (and on the raw-prefix fallback).
pub const EXCERPT_MAX_CHARS: usize = 4_000;

/// Numbered section heading, e.g. "2.1 Health Sector".
static SECTION_HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+(\.\d+)?\s+").expect("valid regex"));

static TRAILING_PAGE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+\d+$").expect("valid regex"));

/// Select the paragraphs relevant to gender equality and inequality
/// reduction. Falls back to a prefix of the raw input when nothing
/// matches, so the result is non-empty whenever the input is.
pub fn filter_relevant(text: &str) -> String {
    let mut relevant = Vec::new();

    for paragraph in text.split('\n') {
        let paragraph = paragraph.trim();
        if paragraph.len() < MIN_PARAGRAPH_CHARS {
            continue;
        }
        if SECTION_HEADING_RE.is_match(paragraph) {
            continue;
        }
        if paragraph.contains("...") || TRAILING_PAGE_NUMBER_RE.is_match(paragraph) {
            continue;
        }
        if matches_keyword(paragraph) {
            relevant.push(paragraph);
        }
    }

    if relevant.is_empty() {
        tracing::debug!("No SDG-relevant paragraphs found, using raw text prefix");
        return truncate_chars(text, EXCERPT_MAX_CHARS).to_string();
    }

    tracing::debug!(paragraphs = relevant.len(), "Selected SDG-relevant paragraphs");
    truncate_chars(&relevant.join("\n"), EXCERPT_MAX_CHARS).to_string()
}

fn matches_keyword(paragraph: &str) -> bool {
    let lower = paragraph.to_lowercase();
    SDG_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}
