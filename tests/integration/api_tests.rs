//! HTTP API tests driven through the router with `oneshot`

use crate::support::FakeSite;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use site_corpus::api::router;
use site_corpus::config::Config;
use site_corpus::service::{CrawlService, SharedStore};
use site_corpus::storage::SqliteStorage;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

fn test_config() -> Config {
    let mut config = Config::default();
    config.crawler.retry_backoff_ms = 0;
    config.crawler.default_max_pages = 3;
    config.output.json_dir = String::new();
    config
}

fn app(site: FakeSite) -> Router {
    let store: SharedStore = Arc::new(Mutex::new(SqliteStorage::open_in_memory().unwrap()));
    router(CrawlService::start(site, store, &test_config()))
}

fn small_site() -> FakeSite {
    FakeSite::builder()
        .page(
            "https://example.com",
            r#"<html><head><title>Home</title></head><body>
                <p>Welcome</p><a href="/about">About</a><a href="/contact">Contact</a>
            </body></html>"#,
        )
        .page(
            "https://example.com/about",
            r#"<html><head><title>About</title></head><body><p>About us</p></body></html>"#,
        )
        .build()
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn submit(app: &Router, max_pages: usize) -> String {
    let (status, body) = send(
        app,
        "POST",
        &format!("/crawl?url=https%3A%2F%2Fexample.com&max_pages={}", max_pages),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "queued");
    body["job_id"].as_str().unwrap().to_string()
}

async fn wait_until_finished(app: &Router, job_id: &str) -> Value {
    for _ in 0..300 {
        let (status, body) = send(app, "GET", &format!("/status/{}", job_id), None).await;
        assert_eq!(status, StatusCode::OK);
        if body["status"] == "completed" || body["status"] == "failed" {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {} did not finish", job_id);
}

#[tokio::test]
async fn test_root_greeting() {
    let app = app(small_site());
    let (status, body) = send(&app, "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Hello, world!" }));
}

#[tokio::test]
async fn test_crawl_rejects_invalid_url() {
    let app = app(small_site());

    let (status, body) = send(&app, "POST", "/crawl?url=not-a-url", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());

    let (status, _) = send(&app, "POST", "/crawl?url=ftp%3A%2F%2Fexample.com", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/crawl?url=https%3A%2F%2Fexample.com&max_pages=0",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_crawl_requires_url_parameter() {
    let app = app(small_site());
    let (status, _) = send(&app, "POST", "/crawl", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_job_is_not_found() {
    let app = app(small_site());
    let unknown = "7c9e6679-7425-40de-944b-e07fc1f90ae7";

    for (method, uri) in [
        ("GET", format!("/status/{}", unknown)),
        ("POST", format!("/cancel/{}", unknown)),
        ("GET", format!("/get-output/{}", unknown)),
        ("DELETE", format!("/jobs/{}", unknown)),
        ("GET", "/status/not-a-job-id".to_string()),
    ] {
        let (status, body) = send(&app, method, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{} {}", method, uri);
        assert!(body["detail"].is_string());
    }

    let (status, _) = send(
        &app,
        "POST",
        &format!("/filtered-output/{}", unknown),
        Some(json!({ "urls": ["https://example.com"] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_crawl_lifecycle() {
    let app = app(small_site());
    let job_id = submit(&app, 5).await;

    let snapshot = wait_until_finished(&app, &job_id).await;
    assert_eq!(snapshot["status"], "completed");
    assert_eq!(snapshot["stop_reason"], "frontier_exhausted");
    assert_eq!(snapshot["pages_crawled"], 2);
    assert_eq!(snapshot["links_found"], 3);
    assert_eq!(snapshot["crawled_urls"][0], "https://example.com");
    // /contact is not on the site
    assert_eq!(snapshot["errors"].as_array().unwrap().len(), 1);

    let (status, corpus) = send(&app, "GET", &format!("/get-output/{}", job_id), None).await;
    assert_eq!(status, StatusCode::OK);
    let corpus = corpus.as_array().unwrap();
    assert_eq!(corpus.len(), 2);
    assert_eq!(corpus[0]["title"], "Home");
    assert_eq!(corpus[0]["url"], "https://example.com");
    assert_eq!(corpus[0]["text"], "Welcome About Contact");

    let (status, filtered) = send(
        &app,
        "POST",
        &format!("/filtered-output/{}", job_id),
        Some(json!({
            "urls": ["https://example.com/about/", "https://example.com/missing"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(filtered["job_id"], job_id.as_str());
    assert_eq!(filtered["filtered_data"][0]["title"], "About");
    assert_eq!(filtered["missing_urls"], json!(["https://example.com/missing"]));
}

#[tokio::test]
async fn test_output_not_ready_while_running() {
    let site = FakeSite::builder()
        .page("https://example.com", "<html><body>slow</body></html>")
        .delay(Duration::from_millis(300))
        .build();
    let app = app(site);
    let job_id = submit(&app, 1).await;

    let (status, body) = send(&app, "GET", &format!("/get-output/{}", job_id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["detail"].as_str().unwrap().contains("not ready"));

    let (status, _) = send(
        &app,
        "POST",
        &format!("/filtered-output/{}", job_id),
        Some(json!({ "urls": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    wait_until_finished(&app, &job_id).await;
    let (status, _) = send(&app, "GET", &format!("/get-output/{}", job_id), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_filtered_output_requires_url_list() {
    let app = app(small_site());
    let job_id = submit(&app, 1).await;
    wait_until_finished(&app, &job_id).await;

    let (status, _) = send(
        &app,
        "POST",
        &format!("/filtered-output/{}", job_id),
        Some(json!({ "urls": "https://example.com" })),
    )
    .await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_cancel_returns_snapshot() {
    let site = FakeSite::builder()
        .page("https://example.com", "<html><body>slow</body></html>")
        .delay(Duration::from_millis(100))
        .build();
    let app = app(site);
    let job_id = submit(&app, 5).await;

    let (status, body) = send(&app, "POST", &format!("/cancel/{}", job_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["job_id"], job_id.as_str());

    let snapshot = wait_until_finished(&app, &job_id).await;
    assert_eq!(snapshot["status"], "completed");
    assert_eq!(snapshot["stop_reason"], "cancelled");
}

#[tokio::test]
async fn test_purged_job_output_comes_from_storage() {
    let app = app(small_site());
    let job_id = submit(&app, 5).await;
    wait_until_finished(&app, &job_id).await;

    let (status, _) = send(&app, "DELETE", &format!("/jobs/{}", job_id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &format!("/status/{}", job_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The worker stores the corpus right after the run completes
    let mut last = StatusCode::NOT_FOUND;
    for _ in 0..100 {
        let (status, corpus) = send(&app, "GET", &format!("/get-output/{}", job_id), None).await;
        last = status;
        if status == StatusCode::OK {
            assert_eq!(corpus.as_array().unwrap().len(), 2);
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(last, StatusCode::OK);
}
