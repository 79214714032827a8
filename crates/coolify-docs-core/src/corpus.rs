//! A parsed corpus together with its index.
//!
//! [`Corpus`] is the unit the search engine holds once a load succeeds: the
//! chunks are kept alongside the index so hits can be mapped back to their
//! text for snippet extraction.

use crate::index::{DocIndex, IndexError};
use crate::models::{round_score, DocChunk, SearchResult};
use crate::snippet::snippet_for;

#[derive(Debug)]
pub struct Corpus {
    chunks: Vec<DocChunk>,
    index: DocIndex,
}

impl Corpus {
    /// Index `chunks` and take ownership of them.
    pub fn build(chunks: Vec<DocChunk>) -> Result<Self, IndexError> {
        let index = DocIndex::build(&chunks)?;
        Ok(Self { chunks, index })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn index(&self) -> &DocIndex {
        &self.index
    }

    /// Rank chunks for `query` and return at most `limit` results.
    ///
    /// Hits whose score rounds to `0.00` are dropped before truncating, so
    /// every result carries a positive score. `limit` only truncates; it
    /// never changes the order of the hits.
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchResult> {
        self.index
            .search(query)
            .into_iter()
            .map(|(id, score)| (id, round_score(score)))
            .filter(|(_, score)| *score > 0.0)
            .take(limit)
            .filter_map(|(id, score)| {
                let chunk = self.chunks.get(id)?;
                Some(SearchResult {
                    title: chunk.title.clone(),
                    url: chunk.url.clone(),
                    description: chunk.description.clone(),
                    snippet: snippet_for(&self.chunks, id, query),
                    score,
                })
            })
            .collect()
    }
}
