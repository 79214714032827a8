//! Lazily loaded documentation search engine.
//!
//! The corpus (every docs page concatenated into one text file) is fetched
//! over HTTP the first time someone searches, parsed into chunks, indexed,
//! and then held for the lifetime of the engine.
//!
//! # Load lifecycle
//!
//! ```text
//!            first search                 fetch + index ok
//!   Empty ─────────────────▶ Loading ─────────────────────▶ Ready
//!     ▲                         │
//!     └──── fetch/index error ──┘  (next search starts a fresh attempt)
//! ```
//!
//! While `Loading`, every caller awaits the same [`Shared`] future, so any
//! number of concurrent searches produce exactly one fetch, and all of them
//! observe the same outcome. The mutex only guards swapping the state slot
//! and is never held across an `.await`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use thiserror::Error;
use tracing::{debug, info, warn};

use coolify_docs_core::corpus::Corpus;
use coolify_docs_core::models::SearchResult;
use coolify_docs_core::parse::parse_corpus;

use crate::config::{Config, DocsConfig};

/// Result count used when the caller does not pass a limit.
pub const DEFAULT_LIMIT: usize = 5;

/// Failures surfaced by [`DocsEngine::search`].
///
/// `Clone` because a single failed load is delivered to every caller that
/// was waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocsError {
    /// Network error, timeout, or non-success HTTP status.
    #[error("failed to fetch documentation: {message}")]
    Fetch {
        message: String,
        status: Option<u16>,
    },
    /// A load reported success without producing a usable index.
    #[error("documentation index unavailable: {0}")]
    IndexUnavailable(String),
}

/// Where the raw corpus text comes from.
#[async_trait]
pub trait CorpusSource: Send + Sync {
    async fn fetch(&self) -> Result<String, DocsError>;
}

/// Fetches the corpus with a single HTTP GET bounded by a timeout.
pub struct HttpCorpusSource {
    client: reqwest::Client,
    url: String,
}

impl HttpCorpusSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("coolify-mcp/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn from_config(config: &DocsConfig) -> anyhow::Result<Self> {
        Self::new(
            config.corpus_url.clone(),
            Duration::from_secs(config.fetch_timeout_secs),
        )
    }
}

#[async_trait]
impl CorpusSource for HttpCorpusSource {
    async fn fetch(&self) -> Result<String, DocsError> {
        let transport_error = |e: reqwest::Error| DocsError::Fetch {
            message: if e.is_timeout() {
                format!("request to {} timed out", self.url)
            } else {
                format!("request to {} failed: {}", self.url, e)
            },
            status: None,
        };

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DocsError::Fetch {
                message: format!("{} returned HTTP {}", self.url, status),
                status: Some(status.as_u16()),
            });
        }

        response.text().await.map_err(transport_error)
    }
}

type LoadOutcome = Result<Arc<Corpus>, DocsError>;
type LoadFuture = Shared<BoxFuture<'static, LoadOutcome>>;

enum LoadState {
    Empty,
    Loading { attempt: u64, load: LoadFuture },
    Ready(Arc<Corpus>),
}

struct Inner {
    state: LoadState,
    attempts: u64,
}

/// Externally visible phase of the load lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    Empty,
    Loading,
    Ready,
}

/// Documentation search engine owning the fetch-once corpus.
pub struct DocsEngine {
    source: Arc<dyn CorpusSource>,
    site_url: String,
    default_limit: usize,
    inner: Mutex<Inner>,
}

impl DocsEngine {
    pub fn new(source: Arc<dyn CorpusSource>, site_url: impl Into<String>) -> Self {
        Self {
            source,
            site_url: site_url.into(),
            default_limit: DEFAULT_LIMIT,
            inner: Mutex::new(Inner {
                state: LoadState::Empty,
                attempts: 0,
            }),
        }
    }

    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit.max(1);
        self
    }

    /// Engine backed by [`HttpCorpusSource`] using the `[docs]` settings.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let source = HttpCorpusSource::from_config(&config.docs)?;
        Ok(Self::new(Arc::new(source), config.docs.site_url.clone())
            .with_default_limit(config.docs.default_limit))
    }

    pub fn default_limit(&self) -> usize {
        self.default_limit
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn phase(&self) -> EnginePhase {
        match self.lock().state {
            LoadState::Empty => EnginePhase::Empty,
            LoadState::Loading { .. } => EnginePhase::Loading,
            LoadState::Ready(_) => EnginePhase::Ready,
        }
    }

    /// Number of indexed chunks; 0 until a load has succeeded.
    pub fn chunk_count(&self) -> usize {
        match &self.lock().state {
            LoadState::Ready(corpus) => corpus.len(),
            _ => 0,
        }
    }

    /// Make sure the corpus is loaded, joining an in-flight load if there is one.
    pub async fn ensure_loaded(&self) -> Result<Arc<Corpus>, DocsError> {
        let (attempt, load) = {
            let mut guard = self.lock();
            let inner = &mut *guard;
            match &inner.state {
                LoadState::Ready(corpus) => return Ok(Arc::clone(corpus)),
                LoadState::Loading { attempt, load } => (*attempt, load.clone()),
                LoadState::Empty => {
                    inner.attempts += 1;
                    let attempt = inner.attempts;
                    let load = self.start_load(attempt);
                    inner.state = LoadState::Loading {
                        attempt,
                        load: load.clone(),
                    };
                    (attempt, load)
                }
            }
        };

        let outcome = load.await;
        self.settle(attempt, &outcome);
        outcome
    }

    fn start_load(&self, attempt: u64) -> LoadFuture {
        let source = Arc::clone(&self.source);
        let site_url = self.site_url.clone();

        async move {
            debug!(attempt, "loading documentation corpus");
            let raw = source.fetch().await?;
            let chunks = parse_corpus(&raw, &site_url);
            let corpus =
                Corpus::build(chunks).map_err(|e| DocsError::IndexUnavailable(e.to_string()))?;
            Ok(Arc::new(corpus))
        }
        .boxed()
        .shared()
    }

    /// Move out of `Loading` once the attempt resolves. Only the first waiter
    /// to get here for a given attempt changes anything.
    fn settle(&self, attempt: u64, outcome: &LoadOutcome) {
        let mut inner = self.lock();
        let is_current = matches!(
            &inner.state,
            LoadState::Loading { attempt: current, .. } if *current == attempt
        );
        if !is_current {
            return;
        }

        inner.state = match outcome {
            Ok(corpus) => {
                if corpus.is_empty() {
                    warn!("documentation corpus contained no parseable pages");
                }
                info!(
                    chunks = corpus.len(),
                    terms = corpus.index().term_count(),
                    "documentation index ready"
                );
                LoadState::Ready(Arc::clone(corpus))
            }
            Err(e) => {
                warn!(attempt, error = %e, "documentation load failed");
                LoadState::Empty
            }
        };
    }

    /// Ranked search over the documentation.
    ///
    /// Loads the corpus first if needed; a failed load is returned as-is and
    /// no query runs. `limit` defaults to the engine's default limit.
    pub async fn search(
        &self,
        query: &str,
        limit: Option<usize>,
    ) -> Result<Vec<SearchResult>, DocsError> {
        let corpus = self.ensure_loaded().await?;
        let limit = limit.unwrap_or(self.default_limit);
        let results = corpus.search(query, limit);
        debug!(query, limit, hits = results.len(), "docs search");
        Ok(results)
    }
}

/// `docs search` CLI command: print ranked results to stdout.
pub async fn run_search(config: &Config, query: &str, limit: Option<usize>) -> anyhow::Result<()> {
    if query.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }

    let engine = DocsEngine::from_config(config)?;
    let results = engine.search(query, limit).await?;

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, r) in results.iter().enumerate() {
        println!("{}. [{:.2}] {}", i + 1, r.score, r.title);
        println!("   {}", r.url);
        if !r.snippet.is_empty() {
            println!("   {}", r.snippet.replace('\n', " "));
        }
        println!();
    }
    println!("{} results ({} chunks indexed)", results.len(), engine.chunk_count());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticSource(&'static str);

    #[async_trait]
    impl CorpusSource for StaticSource {
        async fn fetch(&self) -> Result<String, DocsError> {
            Ok(self.0.to_string())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl CorpusSource for FailingSource {
        async fn fetch(&self) -> Result<String, DocsError> {
            Err(DocsError::Fetch {
                message: "https://docs.test/llms.txt returned HTTP 503 Service Unavailable"
                    .to_string(),
                status: Some(503),
            })
        }
    }

    const PAGE: &str = "---\nurl: /get-started/installation.md\ndescription: >-\n  Install Coolify.\n---\n\n# Installation\n\nRun the installation script on your server.";

    #[tokio::test]
    async fn test_phases() {
        let engine = DocsEngine::new(Arc::new(StaticSource(PAGE)), "https://coolify.io/docs");
        assert_eq!(engine.phase(), EnginePhase::Empty);
        assert_eq!(engine.chunk_count(), 0);

        let results = engine.search("installation", None).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(engine.phase(), EnginePhase::Ready);
        assert_eq!(engine.chunk_count(), 1);
    }

    #[tokio::test]
    async fn test_failure_resets_to_empty() {
        let engine = DocsEngine::new(Arc::new(FailingSource), "https://coolify.io/docs");
        let err = engine.search("anything", None).await.unwrap_err();
        assert!(matches!(err, DocsError::Fetch { status: Some(503), .. }));
        assert!(err.to_string().starts_with("failed to fetch documentation"));
        assert!(err.to_string().contains("503"));
        assert_eq!(engine.phase(), EnginePhase::Empty);
        assert_eq!(engine.chunk_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_corpus_is_ready_with_no_results() {
        let engine = DocsEngine::new(Arc::new(StaticSource("")), "https://coolify.io/docs");
        assert!(engine.search("docker", None).await.unwrap().is_empty());
        assert_eq!(engine.phase(), EnginePhase::Ready);
        assert_eq!(engine.chunk_count(), 0);
    }

    #[test]
    fn test_default_limit_floor() {
        let engine =
            DocsEngine::new(Arc::new(StaticSource(PAGE)), "https://x.test").with_default_limit(0);
        assert_eq!(engine.default_limit(), 1);
    }
}
