//! Data types shared by the parser, the index, and the search frontends.

use serde::Serialize;

/// One indexed, independently retrievable unit of documentation text:
/// either a whole page introduction or one of its `##` sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocChunk {
    /// Position of the chunk in the parsed corpus. Ids are contiguous from 0.
    pub id: usize,
    /// Page title, or `"<page title> > <section heading>"` for sections.
    pub title: String,
    /// Canonical absolute URL of the page (no `.md` suffix).
    pub url: String,
    /// Page-level summary from the front-matter, shared by all chunks of a page.
    pub description: String,
    /// Body text of the chunk without its own heading line.
    pub content: String,
}

/// A ranked hit returned to tool callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub description: String,
    /// Query-dependent excerpt of the chunk content. May be empty.
    pub snippet: String,
    /// Relevance score rounded to two decimal places.
    pub score: f64,
}

/// Round a raw relevance score to two decimal places.
pub fn round_score(score: f64) -> f64 {
    (score * 100.0).round() / 100.0
}
