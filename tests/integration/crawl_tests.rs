//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end over real HTTP.

use crate::support::{assert_invariants, test_crawler_config};
use site_corpus::config::UserAgentConfig;
use site_corpus::crawler::{CrawlEngine, HttpLoader};
use site_corpus::service::{run_job, SharedStore};
use site_corpus::state::{JobRegistry, JobStatus, PageRecord, StopReason};
use site_corpus::storage::{CorpusStore, SqliteStorage};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_user_agent() -> UserAgentConfig {
    UserAgentConfig {
        name: "TestBot".to_string(),
        version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
    }
}

fn engine(concurrency: usize) -> CrawlEngine<HttpLoader> {
    let loader = HttpLoader::from_config(&test_user_agent()).expect("Failed to build HTTP client");
    CrawlEngine::new(loader, &test_crawler_config(concurrency))
}

fn html_page(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body.into())
        .insert_header("content-type", "text/html; charset=utf-8")
}

async fn mount_page(server: &MockServer, route: &str, body: impl Into<String>) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html_page(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_single_site() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(
        &server,
        "/",
        r#"<html><head><title>Home</title></head><body>
            <nav><a href="/page1">Page 1</a></nav>
            <p>Welcome home</p>
            <a href="/page2">Page 2</a>
            <a href="https://elsewhere.example.org/">Elsewhere</a>
        </body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/page1",
        r#"<html><head><title>Page 1</title></head><body><p>First</p><a href="/">Home</a></body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/page2",
        r#"<html><head><title>Page 2</title></head><body><p>Second</p></body></html>"#,
    )
    .await;

    let registry = JobRegistry::new();
    let job = registry.create(base_url.clone(), 10);

    let reason = engine(2).run(&job).await.expect("Crawl failed");

    let snapshot = job.snapshot();
    assert_eq!(reason, StopReason::FrontierExhausted);
    assert_eq!(snapshot.status, JobStatus::Completed);
    assert_eq!(snapshot.pages_crawled, 3);
    assert_eq!(snapshot.links_found, 4);
    assert!(snapshot.errors.is_empty());
    assert_eq!(snapshot.crawled_urls[0], base_url);
    assert_invariants(&snapshot);

    let home = job.read(|j| j.page_records().get(&base_url).cloned()).unwrap();
    assert_eq!(
        home,
        PageRecord {
            title: "Home".to_string(),
            url: base_url.clone(),
            text: "Welcome home Page 2 Elsewhere".to_string(),
        }
    );
}

#[tokio::test]
async fn test_requests_carry_user_agent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", "TestBot/1.0.0 (+https://example.com/contact)"))
        .respond_with(html_page("<html><body>ok</body></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let registry = JobRegistry::new();
    let job = registry.create(server.uri(), 1);

    engine(1).run(&job).await.expect("Crawl failed");

    assert_eq!(job.snapshot().pages_crawled, 1);
}

#[tokio::test]
async fn test_server_errors_are_retried_then_recorded() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        r#"<html><body><a href="/flaky">Flaky</a></body></html>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let registry = JobRegistry::new();
    let job = registry.create(server.uri(), 5);

    engine(2).run(&job).await.expect("Crawl failed");

    let snapshot = job.snapshot();
    assert_eq!(snapshot.status, JobStatus::Completed);
    assert_eq!(snapshot.pages_crawled, 1);
    assert_eq!(snapshot.errors.len(), 1);
    assert_eq!(
        snapshot.errors[0].message,
        format!(
            "Failed to navigate to {}/flaky: HTTP status 503 (Attempt 3/3)",
            server.uri()
        )
    );
    assert_invariants(&snapshot);
}

#[tokio::test]
async fn test_non_html_and_missing_pages_fail_once() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        r#"<html><body><a href="/data">Data</a><a href="/gone">Gone</a></body></html>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("{}")
                .insert_header("content-type", "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let registry = JobRegistry::new();
    let job = registry.create(server.uri(), 5);

    engine(2).run(&job).await.expect("Crawl failed");

    let snapshot = job.snapshot();
    assert_eq!(snapshot.pages_crawled, 1);
    assert_eq!(snapshot.errors.len(), 2);
    assert!(snapshot
        .errors
        .iter()
        .any(|e| e.message.contains("unsupported content type: application/json")));
    assert!(snapshot
        .errors
        .iter()
        .any(|e| e.message.contains("HTTP status 404")));
}

#[tokio::test]
async fn test_redirected_page_links_resolve_against_final_url() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        r#"<html><body><a href="/old/index">Moved</a></body></html>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/old/index"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new/index"))
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/new/index",
        r#"<html><body><a href="sibling">Sibling</a></body></html>"#,
    )
    .await;
    mount_page(&server, "/new/sibling", "<html><body>Found</body></html>").await;

    let registry = JobRegistry::new();
    let job = registry.create(server.uri(), 10);

    engine(1).run(&job).await.expect("Crawl failed");

    let snapshot = job.snapshot();
    assert_eq!(snapshot.pages_crawled, 3);
    assert!(snapshot
        .crawled_urls
        .contains(&format!("{}/new/sibling", server.uri())));
}

#[tokio::test]
async fn test_unreachable_seed_fails_job() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let registry = JobRegistry::new();
    let job = registry.create(server.uri(), 5);

    assert!(engine(1).run(&job).await.is_err());

    let snapshot = job.snapshot();
    assert_eq!(snapshot.status, JobStatus::Failed);
    assert_eq!(snapshot.errors.len(), 1);
    assert!(snapshot.errors[0].message.starts_with("Crawl aborted"));
}

#[tokio::test]
async fn test_finished_job_is_published() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><head><title>Home</title></head><body><a href="/about">About</a></body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/about",
        r#"<html><head><title>About</title></head><body>About us</body></html>"#,
    )
    .await;

    let dir = TempDir::new().unwrap();
    let storage = SqliteStorage::new(&dir.path().join("corpus.db")).unwrap();
    let store: SharedStore = Arc::new(Mutex::new(storage));

    let registry = JobRegistry::new();
    let job = registry.create(server.uri(), 10);

    run_job(&engine(2), &store, Some(dir.path()), &job)
        .await
        .expect("Crawl failed");

    let stored = store.lock().unwrap().load_corpus(job.id()).unwrap().unwrap();
    let titles: Vec<&str> = stored.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["Home", "About"]);

    let exported = std::fs::read_to_string(dir.path().join(format!("{}.json", job.id()))).unwrap();
    let exported: Vec<PageRecord> = serde_json::from_str(&exported).unwrap();
    assert_eq!(exported, stored);
}
