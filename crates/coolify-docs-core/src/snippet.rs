//! Query-dependent snippet extraction.
//!
//! Picks the [`SNIPPET_WINDOW`]-character window of a chunk that contains
//! the most distinct query terms, scanning in [`SNIPPET_STRIDE`] steps.
//! All offsets are in characters, not bytes.

use crate::models::DocChunk;

pub const SNIPPET_WINDOW: usize = 300;
pub const SNIPPET_STRIDE: usize = 50;
const ELLIPSIS: &str = "...";

/// Snippet for the chunk with the given id, or an empty string when the id
/// is out of range.
pub fn snippet_for(chunks: &[DocChunk], id: usize, query: &str) -> String {
    chunks
        .get(id)
        .map(|chunk| best_snippet(&chunk.content, query))
        .unwrap_or_default()
}

/// Extract the most query-dense window of `content`.
///
/// The first window with the strictly highest number of matching terms wins,
/// so a query that matches nothing yields the opening window.
pub fn best_snippet(content: &str, query: &str) -> String {
    if content.is_empty() {
        return String::new();
    }

    let chars: Vec<char> = content.chars().collect();
    // One lowercase char per source char keeps offsets aligned.
    let lowered: Vec<char> = chars.iter().map(|c| fold_char(*c)).collect();

    // Query folded the same way, or multi-char lowercasings never match.
    let query: String = query.chars().map(fold_char).collect();
    let mut terms: Vec<&str> = query.split_whitespace().collect();
    terms.sort_unstable();
    terms.dedup();

    let mut best_start = 0;
    let mut best_count = 0;

    for start in (0..lowered.len()).step_by(SNIPPET_STRIDE) {
        let end = (start + SNIPPET_WINDOW).min(lowered.len());
        let window: String = lowered[start..end].iter().collect();
        let count = terms.iter().filter(|t| window.contains(**t)).count();
        if count > best_count {
            best_count = count;
            best_start = start;
        }
    }

    let end = (best_start + SNIPPET_WINDOW).min(chars.len());
    let excerpt: String = chars[best_start..end].iter().collect();

    let mut snippet = String::with_capacity(excerpt.len() + 2 * ELLIPSIS.len());
    if best_start > 0 {
        snippet.push_str(ELLIPSIS);
    }
    snippet.push_str(excerpt.trim());
    if end < chars.len() {
        snippet.push_str(ELLIPSIS);
    }
    snippet
}

/// First char of the lowercase mapping of `c`.
fn fold_char(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}
