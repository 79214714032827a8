//! Load lifecycle and query behaviour of the docs engine, driven by an
//! in-memory corpus source that counts fetches.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use coolify_docs_core::parse::parse_corpus;
use coolify_mcp::docs::{CorpusSource, DocsEngine, DocsError, EnginePhase};

use common::{CORPUS, SITE};

/// Fails the first `failures` fetches with HTTP 500, then serves the corpus.
struct ScriptedSource {
    calls: AtomicUsize,
    failures: usize,
    delay: Duration,
}

impl ScriptedSource {
    fn new(failures: usize, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            failures,
            delay,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CorpusSource for ScriptedSource {
    async fn fetch(&self) -> Result<String, DocsError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if call < self.failures {
            return Err(DocsError::Fetch {
                message: "https://coolify.io/docs/llms-full.txt returned HTTP 500 Internal Server Error".to_string(),
                status: Some(500),
            });
        }
        Ok(CORPUS.to_string())
    }
}

fn engine(source: &Arc<ScriptedSource>) -> Arc<DocsEngine> {
    Arc::new(DocsEngine::new(source.clone(), SITE))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_searches_share_one_fetch() {
    let source = ScriptedSource::new(0, Duration::from_millis(150));
    let engine = engine(&source);

    let mut handles = Vec::new();
    for _ in 0..16 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine.search("docker compose", Some(3)).await
        }));
    }

    for handle in handles {
        let results = handle.await.unwrap().unwrap();
        assert!(!results.is_empty());
    }

    assert_eq!(source.calls(), 1);
    assert_eq!(engine.phase(), EnginePhase::Ready);
}

#[tokio::test]
async fn test_concurrent_waiters_all_see_the_same_failure() {
    let source = ScriptedSource::new(1, Duration::from_millis(150));
    let engine = engine(&source);

    let searches = (0..8).map(|_| engine.search("installation", None));
    let outcomes = futures::future::join_all(searches).await;

    assert_eq!(source.calls(), 1);
    for outcome in outcomes {
        match outcome {
            Err(DocsError::Fetch { status, .. }) => assert_eq!(status, Some(500)),
            other => panic!("expected fetch failure, got {:?}", other),
        }
    }
    assert_eq!(engine.phase(), EnginePhase::Empty);
}

#[tokio::test]
async fn test_failed_load_is_retried_by_next_search() {
    let source = ScriptedSource::new(1, Duration::from_millis(1));
    let engine = engine(&source);

    let err = engine.search("installation", None).await.unwrap_err();
    assert!(err.to_string().contains("HTTP 500"));
    assert_eq!(engine.chunk_count(), 0);

    let results = engine.search("installation", None).await.unwrap();
    assert!(!results.is_empty());
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn test_ready_corpus_is_not_refetched() {
    let source = ScriptedSource::new(0, Duration::from_millis(1));
    let engine = engine(&source);

    for query in ["installation", "compose", "502", "nothing-matches-this"] {
        engine.search(query, None).await.unwrap();
    }
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn test_chunk_count_before_and_after_load() {
    let source = ScriptedSource::new(0, Duration::from_millis(1));
    let engine = engine(&source);

    assert_eq!(engine.chunk_count(), 0);
    engine.ensure_loaded().await.unwrap();
    assert_eq!(engine.chunk_count(), parse_corpus(CORPUS, SITE).len());
    assert_eq!(engine.chunk_count(), 8);
}

#[tokio::test]
async fn test_docker_compose_query_ranks_compose_page_first() {
    let source = ScriptedSource::new(0, Duration::from_millis(1));
    let engine = engine(&source);

    let results = engine
        .search("docker compose environment variables", None)
        .await
        .unwrap();
    assert_eq!(
        results[0].url,
        "https://coolify.io/docs/knowledge-base/docker/compose"
    );
}

#[tokio::test]
async fn test_no_match_returns_empty() {
    let source = ScriptedSource::new(0, Duration::from_millis(1));
    let engine = engine(&source);
    assert!(engine.search("xylophone", None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_limit_caps_results() {
    let source = ScriptedSource::new(0, Duration::from_millis(1));
    let engine = engine(&source);

    let wide = engine
        .search("coolify compose server port", Some(10))
        .await
        .unwrap();
    assert!(wide.len() > 2);

    let narrow = engine
        .search("coolify compose server port", Some(2))
        .await
        .unwrap();
    assert_eq!(narrow.len(), 2);
    assert_eq!(narrow[0].url, wide[0].url);
}

#[tokio::test]
async fn test_default_limit_is_five() {
    let source = ScriptedSource::new(0, Duration::from_millis(1));
    let engine = engine(&source);

    let results = engine
        .search("coolify compose server port application", None)
        .await
        .unwrap();
    assert!(results.len() <= 5);
}

#[tokio::test]
async fn test_results_have_rounded_scores_and_snippets() {
    let source = ScriptedSource::new(0, Duration::from_millis(1));
    let engine = engine(&source);

    let results = engine.search("proxy port 502", Some(10)).await.unwrap();
    assert!(!results.is_empty());
    for r in &results {
        assert!(r.score.is_finite() && r.score > 0.0);
        assert_eq!(r.score, (r.score * 100.0).round() / 100.0);
        assert!(!r.url.contains(".md"));
    }
    for pair in results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    assert!(results.iter().any(|r| r.snippet.contains("502")));
}
