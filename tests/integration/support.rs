//! Shared helpers: a scripted in-memory site and job-state checks

use site_corpus::config::CrawlerConfig;
use site_corpus::crawler::{AttemptError, LoadedPage, PageLoader};
use site_corpus::state::JobSnapshot;
use site_corpus::url::canonical_key;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

#[derive(Clone)]
enum Behavior {
    Page(String),
    Fail(AttemptError),
    Hang,
}

struct Inner {
    pages: HashMap<String, Behavior>,
    calls: Mutex<HashMap<String, u32>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    delay: Duration,
}

/// In-memory website keyed by canonical URL; unknown URLs answer 404
#[derive(Clone)]
pub struct FakeSite {
    inner: Arc<Inner>,
}

pub struct FakeSiteBuilder {
    pages: HashMap<String, Behavior>,
    delay: Duration,
}

impl FakeSite {
    pub fn builder() -> FakeSiteBuilder {
        FakeSiteBuilder {
            pages: HashMap::new(),
            delay: Duration::ZERO,
        }
    }

    /// Number of load attempts made for `url`
    pub fn calls(&self, url: &str) -> u32 {
        self.inner
            .calls
            .lock()
            .unwrap()
            .get(url)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> u32 {
        self.inner.calls.lock().unwrap().values().sum()
    }

    /// Highest number of loads observed running at once
    pub fn peak_in_flight(&self) -> usize {
        self.inner.peak.load(Ordering::SeqCst)
    }
}

impl FakeSiteBuilder {
    pub fn page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), Behavior::Page(html.into()));
        self
    }

    /// A page whose body is just a list of links
    pub fn links(self, url: &str, targets: &[&str]) -> Self {
        let anchors: String = targets
            .iter()
            .map(|t| format!(r#"<a href="{}">{}</a>"#, t, t))
            .collect();
        let html = format!(
            "<html><head><title>{}</title></head><body><p>Page {}</p>{}</body></html>",
            url, url, anchors
        );
        self.page(url, html)
    }

    pub fn failing(mut self, url: &str, error: AttemptError) -> Self {
        self.pages.insert(url.to_string(), Behavior::Fail(error));
        self
    }

    /// A page that never answers
    pub fn hanging(mut self, url: &str) -> Self {
        self.pages.insert(url.to_string(), Behavior::Hang);
        self
    }

    /// Every load takes at least `delay`
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn build(self) -> FakeSite {
        FakeSite {
            inner: Arc::new(Inner {
                pages: self.pages,
                calls: Mutex::new(HashMap::new()),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                delay: self.delay,
            }),
        }
    }
}

impl PageLoader for FakeSite {
    async fn load(&self, url: &Url) -> Result<LoadedPage, AttemptError> {
        let key = canonical_key(url);
        *self
            .inner
            .calls
            .lock()
            .unwrap()
            .entry(key.clone())
            .or_insert(0) += 1;

        let now = self.inner.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.peak.fetch_max(now, Ordering::SeqCst);

        if !self.inner.delay.is_zero() {
            tokio::time::sleep(self.inner.delay).await;
        }

        let behavior = self.inner.pages.get(&key).cloned();
        let result = match behavior {
            Some(Behavior::Page(html)) => Ok(LoadedPage {
                final_url: url.clone(),
                html,
            }),
            Some(Behavior::Fail(error)) => Err(error),
            Some(Behavior::Hang) => std::future::pending().await,
            None => Err(AttemptError::HttpStatus(404)),
        };

        self.inner.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Crawler settings for tests: no backoff, short timeouts
pub fn test_crawler_config(concurrency: usize) -> CrawlerConfig {
    CrawlerConfig {
        concurrency,
        attempt_timeout_secs: 1,
        retry_backoff_ms: 0,
        ..CrawlerConfig::default()
    }
}

/// Checks the bookkeeping rules every snapshot must satisfy
pub fn assert_invariants(snapshot: &JobSnapshot) {
    assert_eq!(snapshot.pages_crawled, snapshot.crawled_urls.len());
    assert!(snapshot.links_found >= snapshot.pages_crawled);
    assert!(snapshot.pages_crawled <= snapshot.max_pages);

    let crawled: HashSet<&String> = snapshot.crawled_urls.iter().collect();
    let crawling: HashSet<&String> = snapshot.crawling_urls.iter().collect();
    let failed: HashSet<&String> = snapshot.errors.iter().map(|e| &e.url).collect();

    assert_eq!(crawled.len(), snapshot.crawled_urls.len(), "duplicate crawled URL");
    assert!(crawled.is_disjoint(&crawling));
    assert!(crawled.is_disjoint(&failed));
    assert!(crawling.is_disjoint(&failed));

    if snapshot.status.is_terminal() {
        assert!(snapshot.crawling_urls.is_empty());
        assert!(snapshot.end_time.is_some());
    }
}
