// Tests for mirror orchestration

use sitemirror_core::crawl::{CrawlOptions, CrawlResultCallback, execute_crawl, extract_url_path};
use sitemirror_scanner::{ConfigError, PageResult, ScanError};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// URL Path Extraction Tests
// ============================================================================

#[test]
fn test_extract_url_path_root() {
    assert_eq!(extract_url_path("http://example.com/"), "/");
}

#[test]
fn test_extract_url_path_empty_path() {
    assert_eq!(extract_url_path("http://example.com"), "/");
}

#[test]
fn test_extract_url_path_nested() {
    assert_eq!(extract_url_path("http://example.com/docs/v1/intro"), "/docs/v1/intro");
}

#[test]
fn test_extract_url_path_keeps_query() {
    assert_eq!(extract_url_path("http://example.com/page?id=2"), "/page?id=2");
}

#[test]
fn test_extract_url_path_drops_fragment() {
    assert_eq!(extract_url_path("http://example.com/page#top"), "/page");
}

#[test]
fn test_extract_url_path_invalid_url() {
    assert_eq!(extract_url_path("not a url"), "not a url");
}

// ============================================================================
// execute_crawl Tests
// ============================================================================

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html")
        .set_body_string(body)
}

#[tokio::test]
async fn test_execute_crawl_mirrors_site() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/about">About</a><a href="https://elsewhere.test/">x</a>"#))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html("<p>about us</p>"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut options = CrawlOptions::new(server.uri());
    options.dest = dir.path().join("downloads");
    options.threads = 2;

    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();
    let callback: CrawlResultCallback = Arc::new(move |result: PageResult| {
        seen_clone.lock().unwrap().push(result.url);
    });

    let summary = execute_crawl(options, CancellationToken::new(), Some(callback))
        .await
        .unwrap();

    assert!(!summary.cancelled);
    assert_eq!(summary.fetched_count(), 2);
    assert_eq!(summary.persisted_count(), 2);
    assert_eq!(summary.failed_count(), 0);
    assert!(summary.finished_at >= summary.started_at);
    assert_eq!(seen.lock().unwrap().len(), 2);

    let host_dir = summary
        .destination
        .join(server.uri().trim_start_matches("http://"));
    assert!(host_dir.join("index.html").is_file());
    assert_eq!(
        std::fs::read_to_string(host_dir.join("about")).unwrap(),
        "<p>about us</p>"
    );
}

#[tokio::test]
async fn test_execute_crawl_rejects_missing_seed() {
    let dir = TempDir::new().unwrap();
    let mut options = CrawlOptions::new("  ");
    options.dest = dir.path().to_path_buf();

    let result = execute_crawl(options, CancellationToken::new(), None).await;
    assert!(matches!(
        result,
        Err(ScanError::Config(ConfigError::MissingSeed))
    ));
}

#[tokio::test]
async fn test_execute_crawl_cancelled_before_start() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html("<p>never</p>"))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut options = CrawlOptions::new(server.uri());
    options.dest = dir.path().to_path_buf();

    let cancel = CancellationToken::new();
    cancel.cancel();

    let summary = execute_crawl(options, cancel, None).await.unwrap();
    assert!(summary.cancelled);
    assert_eq!(summary.fetched_count(), 0);
}
