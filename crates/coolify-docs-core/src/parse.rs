//! Corpus parser.
//!
//! Converts the flat documentation corpus (every page of the docs site
//! concatenated into one text file) into [`DocChunk`]s.
//!
//! # Corpus format
//!
//! Pages are joined by a blank line, a `---` rule, another blank line and a
//! second `---` rule. Each page carries a small front-matter block:
//!
//! ```text
//! ---
//! url: /get-started/installation.md
//! description: >-
//!   Install Coolify on any Linux server
//!   with a single command.
//! ---
//!
//! # Installation
//!
//! Intro text.
//!
//! ## Requirements
//!
//! Section text.
//! ```
//!
//! Pages that do not follow this grammar are skipped. Each page body is split
//! before every `## ` heading line; the text before the first heading becomes
//! the page's intro chunk.

use crate::models::DocChunk;

/// Separator between two pages of the corpus.
pub const PAGE_BOUNDARY: &str = "\n\n---\n\n---";

/// Sections shorter than this (in characters, after trimming) are dropped.
pub const MIN_CHUNK_CHARS: usize = 20;

/// Front-matter and body of a single page.
#[derive(Debug)]
struct Page<'a> {
    url_path: &'a str,
    description: String,
    body: &'a str,
}

/// Parse a raw corpus into chunks with contiguous ids starting at 0.
///
/// `site_url` is the base the page paths are joined to. Never fails:
/// malformed pages simply contribute no chunks.
pub fn parse_corpus(raw: &str, site_url: &str) -> Vec<DocChunk> {
    let mut chunks = Vec::new();

    for page_text in raw.split(PAGE_BOUNDARY) {
        let Some(page) = parse_page(page_text) else {
            continue;
        };

        let url = page_url(site_url, page.url_path);
        let page_title = page_title(page.body).unwrap_or(page.url_path);

        for section in split_sections(page.body) {
            let section = section.trim();
            if section.chars().count() < MIN_CHUNK_CHARS {
                continue;
            }

            let (title, content) = match section.strip_prefix("## ") {
                Some(rest) => {
                    let (heading, content) = rest.split_once('\n').unwrap_or((rest, ""));
                    (
                        format!("{} > {}", page_title, heading.trim()),
                        content.trim(),
                    )
                }
                None => (page_title.to_string(), section),
            };

            chunks.push(DocChunk {
                id: chunks.len(),
                title,
                url: url.clone(),
                description: page.description.clone(),
                content: content.to_string(),
            });
        }
    }

    chunks
}

/// Match a page against the front-matter grammar.
fn parse_page(text: &str) -> Option<Page<'_>> {
    let mut rest = text.trim_start();

    // Leading rule is optional: only the very first page keeps it after the split.
    if let Some((first, tail)) = split_line(rest) {
        if first.trim_end() == "---" {
            rest = tail;
        }
    }

    let (url_line, rest) = split_line(rest)?;
    let url_path = url_line.strip_prefix("url:")?.trim();
    if url_path.is_empty() {
        return None;
    }

    let (desc_line, mut rest) = split_line(rest)?;
    let inline = desc_line.strip_prefix("description:")?.trim();

    let mut lines: Vec<&str> = Vec::new();
    if !inline.is_empty() && !is_block_marker(inline) {
        lines.push(inline);
    }

    loop {
        // Running out of input before the closing rule means no match.
        let (line, tail) = split_line(rest)?;
        rest = tail;
        if line.trim_end() == "---" {
            break;
        }
        let line = line.trim();
        if !line.is_empty() {
            lines.push(line);
        }
    }

    if lines.is_empty() {
        return None;
    }

    Some(Page {
        url_path,
        description: lines.join(" "),
        body: rest.trim(),
    })
}

/// YAML block-scalar indicators (`>-`, `|+`, `>2` ...).
fn is_block_marker(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some('>') | Some('|'))
        && chars.all(|c| c == '-' || c == '+' || c.is_ascii_digit())
}

/// Split off the first line. Returns `None` on empty input.
fn split_line(s: &str) -> Option<(&str, &str)> {
    if s.is_empty() {
        return None;
    }
    Some(match s.find('\n') {
        Some(i) => (&s[..i], &s[i + 1..]),
        None => (s, ""),
    })
}

/// First `# ` heading in the body.
fn page_title(body: &str) -> Option<&str> {
    body.lines()
        .filter_map(|line| line.strip_prefix("# "))
        .map(str::trim)
        .find(|title| !title.is_empty())
}

fn page_url(site_url: &str, url_path: &str) -> String {
    let path = url_path.strip_suffix(".md").unwrap_or(url_path);
    let base = site_url.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

/// Partition the body so that every section after the first starts with a
/// `## ` line.
fn split_sections(body: &str) -> Vec<&str> {
    let mut sections = Vec::new();
    let mut start = 0;
    let mut offset = 0;

    for line in body.split_inclusive('\n') {
        if line.starts_with("## ") && offset > start {
            sections.push(&body[start..offset]);
            start = offset;
        }
        offset += line.len();
    }

    if start < body.len() {
        sections.push(&body[start..]);
    }

    sections
}
