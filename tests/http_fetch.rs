//! `HttpCorpusSource` and the docs engine against a local HTTP server.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use coolify_mcp::docs::{CorpusSource, DocsEngine, DocsError, EnginePhase, HttpCorpusSource};

use common::{serve, CORPUS, SITE};

#[derive(Clone, Default)]
struct Hits(Arc<AtomicUsize>);

impl Hits {
    fn bump(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst)
    }

    fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

async fn corpus(State(hits): State<Hits>) -> &'static str {
    hits.bump();
    CORPUS
}

async fn broken(State(hits): State<Hits>) -> Response {
    hits.bump();
    (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response()
}

/// 500 on the first request, the corpus afterwards.
async fn flaky(State(hits): State<Hits>) -> Response {
    if hits.bump() == 0 {
        (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response()
    } else {
        CORPUS.into_response()
    }
}

async fn slow(State(hits): State<Hits>) -> &'static str {
    hits.bump();
    tokio::time::sleep(Duration::from_secs(5)).await;
    CORPUS
}

async fn docs_server() -> (String, Hits) {
    let hits = Hits::default();
    let app = Router::new()
        .route("/llms-full.txt", get(corpus))
        .route("/broken.txt", get(broken))
        .route("/flaky.txt", get(flaky))
        .route("/slow.txt", get(slow))
        .with_state(hits.clone());
    let addr = serve(app).await;
    (format!("http://{}", addr), hits)
}

#[tokio::test]
async fn test_fetch_returns_body() {
    let (base, hits) = docs_server().await;
    let source =
        HttpCorpusSource::new(format!("{}/llms-full.txt", base), Duration::from_secs(5)).unwrap();

    let body = source.fetch().await.unwrap();
    assert_eq!(body, CORPUS);
    assert_eq!(hits.get(), 1);
}

#[tokio::test]
async fn test_fetch_non_success_status() {
    let (base, _hits) = docs_server().await;
    let url = format!("{}/broken.txt", base);
    let source = HttpCorpusSource::new(url.clone(), Duration::from_secs(5)).unwrap();

    match source.fetch().await {
        Err(DocsError::Fetch { message, status }) => {
            assert_eq!(status, Some(500));
            assert!(message.contains(&url));
            assert!(message.contains("500"));
        }
        other => panic!("expected fetch failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_times_out() {
    let (base, _hits) = docs_server().await;
    let source =
        HttpCorpusSource::new(format!("{}/slow.txt", base), Duration::from_millis(200)).unwrap();

    let err = source.fetch().await.unwrap_err();
    assert!(err.to_string().contains("timed out"), "got: {}", err);
    assert!(matches!(err, DocsError::Fetch { status: None, .. }));
}

#[tokio::test]
async fn test_fetch_connection_refused() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let source =
        HttpCorpusSource::new(format!("http://{}/llms-full.txt", addr), Duration::from_secs(2))
            .unwrap();
    let err = source.fetch().await.unwrap_err();
    assert!(matches!(err, DocsError::Fetch { status: None, .. }));
}

#[tokio::test]
async fn test_engine_recovers_after_server_error() {
    let (base, hits) = docs_server().await;
    let source =
        HttpCorpusSource::new(format!("{}/flaky.txt", base), Duration::from_secs(5)).unwrap();
    let engine = DocsEngine::new(Arc::new(source), SITE);

    let err = engine.search("installation", None).await.unwrap_err();
    assert_eq!(
        err,
        DocsError::Fetch {
            message: format!("{}/flaky.txt returned HTTP 500 Internal Server Error", base),
            status: Some(500),
        }
    );
    assert_eq!(engine.phase(), EnginePhase::Empty);

    let results = engine.search("installation", None).await.unwrap();
    assert_eq!(
        results[0].url,
        "https://coolify.io/docs/get-started/installation"
    );
    assert_eq!(engine.phase(), EnginePhase::Ready);
    assert_eq!(hits.get(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_engine_fetches_once_under_concurrency() {
    let (base, hits) = docs_server().await;
    let source =
        HttpCorpusSource::new(format!("{}/llms-full.txt", base), Duration::from_secs(5)).unwrap();
    let engine = Arc::new(DocsEngine::new(Arc::new(source), SITE));

    let mut handles = Vec::new();
    for query in ["compose", "proxy", "installation", "volumes", "port", "uninstall"] {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move { engine.search(query, Some(1)).await }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap().len(), 1);
    }

    assert_eq!(hits.get(), 1);
}
