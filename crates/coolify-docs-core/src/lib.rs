//! # Coolify Docs Core
//!
//! Pure logic behind the documentation search tool: corpus parsing,
//! a lexical inverted index, and snippet extraction.
//!
//! This crate performs no I/O and pulls in no async runtime. Fetching the
//! corpus and owning the index lifecycle is the job of the `coolify-mcp`
//! package, which feeds raw text into [`parse::parse_corpus`] and hands the
//! resulting chunks to [`corpus::Corpus::build`].
//!
//! ```text
//! raw corpus ──▶ parse_corpus ──▶ Vec<DocChunk> ──▶ Corpus::build
//!                                                       │
//!                              query ──▶ Corpus::search ─┴─▶ SearchResult
//! ```

pub mod corpus;
pub mod index;
pub mod models;
pub mod parse;
pub mod snippet;
