//! In-memory inverted index with BM25+ field scoring.
//!
//! Every [`DocChunk`] is indexed under three fields (`title`, `description`,
//! `content`), each with its own boost so that title and description hits
//! outrank body-only hits.
//!
//! # Query expansion
//!
//! Each query term is expanded against the vocabulary before scoring:
//!
//! | Match | Weight |
//! |-------|--------|
//! | exact | `1.0` |
//! | prefix (`deplo` → `deployment`) | `0.375 × q / (q + 0.3 × extra)` |
//! | fuzzy (edit distance `d ≤ round(0.2 × q)`) | `0.45 × q / (q + d)` |
//!
//! where `q` is the query term length in characters. A vocabulary term
//! reached by several routes keeps its highest weight.
//!
//! # Scoring
//!
//! ```text
//! field_score = boost × idf × (δ + tf × (k1 + 1) / (tf + k1 × (1 − b + b × len / avg_len)))
//! idf         = ln(1 + (N − df + 0.5) / (df + 0.5))
//! doc_score   = Σ(term weight × field_score) × matched query terms
//! ```
//!
//! Multiplying by the number of matched query terms lets chunks covering
//! more of the query rise above chunks that repeat a single term.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

use thiserror::Error;

use crate::models::DocChunk;

const BM25_K1: f64 = 1.2;
const BM25_B: f64 = 0.7;
const BM25_DELTA: f64 = 0.5;

const PREFIX_WEIGHT: f64 = 0.375;
const FUZZY_WEIGHT: f64 = 0.45;
/// Allowed edit distance as a fraction of the query term length.
const FUZZY_RATIO: f64 = 0.2;
const MAX_FUZZY_DISTANCE: usize = 6;

/// Errors raised while building an index.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("chunk at position {position} has id {id}; ids must be contiguous from 0")]
    NonContiguousId { position: usize, id: usize },
}

/// Indexed chunk fields, in descending order of importance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Description,
    Content,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Title, Field::Description, Field::Content];

    pub fn boost(self) -> f64 {
        match self {
            Field::Title => 3.0,
            Field::Description => 2.0,
            Field::Content => 1.0,
        }
    }

    fn slot(self) -> usize {
        self as usize
    }

    fn text(self, chunk: &DocChunk) -> &str {
        match self {
            Field::Title => &chunk.title,
            Field::Description => &chunk.description,
            Field::Content => &chunk.content,
        }
    }
}

#[derive(Debug, Clone)]
struct Posting {
    doc: usize,
    field: Field,
    tf: u32,
}

/// Inverted index over a fixed set of chunks.
#[derive(Debug, Default)]
pub struct DocIndex {
    terms: BTreeMap<String, Vec<Posting>>,
    field_lengths: Vec<[u32; 3]>,
    avg_field_lengths: [f64; 3],
}

/// Lower-case and split on anything that is not a letter or digit.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

impl DocIndex {
    /// Index `chunks`. Chunk ids must equal their positions.
    pub fn build(chunks: &[DocChunk]) -> Result<Self, IndexError> {
        let mut terms: BTreeMap<String, Vec<Posting>> = BTreeMap::new();
        let mut field_lengths = Vec::with_capacity(chunks.len());
        let mut totals = [0u64; 3];

        for (position, chunk) in chunks.iter().enumerate() {
            if chunk.id != position {
                return Err(IndexError::NonContiguousId {
                    position,
                    id: chunk.id,
                });
            }

            let mut lengths = [0u32; 3];
            for field in Field::ALL {
                let tokens = tokenize(field.text(chunk));
                lengths[field.slot()] = tokens.len() as u32;
                totals[field.slot()] += tokens.len() as u64;

                let mut tf: HashMap<String, u32> = HashMap::new();
                for token in tokens {
                    *tf.entry(token).or_insert(0) += 1;
                }
                for (term, count) in tf {
                    terms.entry(term).or_default().push(Posting {
                        doc: position,
                        field,
                        tf: count,
                    });
                }
            }
            field_lengths.push(lengths);
        }

        let n = chunks.len().max(1) as f64;
        let avg_field_lengths = [
            totals[0] as f64 / n,
            totals[1] as f64 / n,
            totals[2] as f64 / n,
        ];

        Ok(Self {
            terms,
            field_lengths,
            avg_field_lengths,
        })
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.field_lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.field_lengths.is_empty()
    }

    /// Number of distinct terms in the vocabulary.
    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// Rank chunks against `query`.
    ///
    /// Returns `(chunk id, score)` pairs sorted by descending score, ties by
    /// ascending id. Chunks without a positive score are omitted.
    pub fn search(&self, query: &str) -> Vec<(usize, f64)> {
        let mut query_terms = tokenize(query);
        query_terms.sort();
        query_terms.dedup();

        let mut scores: HashMap<usize, (f64, usize)> = HashMap::new();

        for query_term in &query_terms {
            let mut term_scores: HashMap<usize, f64> = HashMap::new();

            for (term, weight) in self.expand(query_term) {
                let Some(postings) = self.terms.get(term) else {
                    continue;
                };
                for field in Field::ALL {
                    let df = postings.iter().filter(|p| p.field == field).count();
                    if df == 0 {
                        continue;
                    }
                    let idf = self.idf(df);
                    for posting in postings.iter().filter(|p| p.field == field) {
                        let score = weight * field.boost() * idf * self.saturation(posting);
                        *term_scores.entry(posting.doc).or_insert(0.0) += score;
                    }
                }
            }

            for (doc, score) in term_scores {
                let entry = scores.entry(doc).or_insert((0.0, 0));
                entry.0 += score;
                entry.1 += 1;
            }
        }

        let mut ranked: Vec<(usize, f64)> = scores
            .into_iter()
            .map(|(doc, (sum, matched))| (doc, sum * matched as f64))
            .filter(|(_, score)| score.is_finite() && *score > 0.0)
            .collect();

        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });

        ranked
    }

    /// Vocabulary terms matched by `query_term`, with their match weights.
    fn expand<'a>(&'a self, query_term: &str) -> HashMap<&'a str, f64> {
        let mut matches: HashMap<&'a str, f64> = HashMap::new();
        let q_len = query_term.chars().count();
        if q_len == 0 {
            return matches;
        }

        let mut keep_max = |term: &'a str, weight: f64| {
            let slot = matches.entry(term).or_insert(0.0);
            if weight > *slot {
                *slot = weight;
            }
        };

        if let Some((term, _)) = self.terms.get_key_value(query_term) {
            keep_max(term.as_str(), 1.0);
        }

        let after = self
            .terms
            .range::<str, _>((Bound::Excluded(query_term), Bound::Unbounded));
        for (term, _) in after.take_while(|(t, _)| t.starts_with(query_term)) {
            let extra = (term.chars().count() - q_len) as f64;
            let weight = PREFIX_WEIGHT * q_len as f64 / (q_len as f64 + 0.3 * extra);
            keep_max(term.as_str(), weight);
        }

        let max_distance =
            ((q_len as f64 * FUZZY_RATIO).round() as usize).min(MAX_FUZZY_DISTANCE);
        if max_distance > 0 {
            let query_chars: Vec<char> = query_term.chars().collect();
            for term in self.terms.keys() {
                if term == query_term {
                    continue;
                }
                if let Some(d) = bounded_levenshtein(&query_chars, term, max_distance) {
                    let weight = FUZZY_WEIGHT * q_len as f64 / (q_len as f64 + d as f64);
                    keep_max(term.as_str(), weight);
                }
            }
        }

        matches
    }

    fn idf(&self, df: usize) -> f64 {
        let n = self.len() as f64;
        let df = df as f64;
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }

    fn saturation(&self, posting: &Posting) -> f64 {
        let slot = posting.field.slot();
        let len = self.field_lengths[posting.doc][slot] as f64;
        let avg = self.avg_field_lengths[slot].max(f64::EPSILON);
        let tf = posting.tf as f64;
        BM25_DELTA + tf * (BM25_K1 + 1.0) / (tf + BM25_K1 * (1.0 - BM25_B + BM25_B * len / avg))
    }
}

/// Levenshtein distance between `a` and `b`, or `None` once it exceeds `max`.
fn bounded_levenshtein(a: &[char], b: &str, max: usize) -> Option<usize> {
    let b: Vec<char> = b.chars().collect();
    if a.len().abs_diff(b.len()) > max {
        return None;
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        let mut row_min = curr[0];
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
            row_min = row_min.min(curr[j + 1]);
        }
        if row_min > max {
            return None;
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    let distance = prev[b.len()];
    (distance <= max).then_some(distance)
}
