//! Live state of a single crawl job
//!
//! `CrawlJob` is written only by the engine running the job. Every mutation goes
//! through a method that keeps the per-URL bookkeeping consistent: a URL is in at
//! most one of `crawling_urls`, `crawled_urls` and `errors`, and the crawled page
//! count is the length of `crawled_urls`.

use crate::CrawlError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque identifier of a crawl job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Generates a fresh random identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Lifecycle status of a crawl job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Submitted, waiting for a worker
    Queued,

    /// The engine is crawling
    InProgress,

    /// Finished; the corpus is available
    Completed,

    /// Aborted by an unrecoverable engine error
    Failed,
}

impl JobStatus {
    /// Returns true if no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(Self::Queued),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

/// Why a completed crawl stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// `pages_crawled` reached `max_pages`
    PageBudget,

    /// No URL left to fetch and nothing in flight
    FrontierExhausted,

    /// Stopped on request; results are partial
    Cancelled,
}

impl StopReason {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::PageBudget => "page_budget",
            Self::FrontierExhausted => "frontier_exhausted",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "page_budget" => Some(Self::PageBudget),
            "frontier_exhausted" => Some(Self::FrontierExhausted),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// Extracted content of one crawled page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub title: String,
    pub url: String,
    pub text: String,
}

/// A URL that could not be crawled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub url: String,
    pub message: String,
    /// Unix timestamp (seconds) of the final attempt
    pub timestamp: i64,
}

/// Authoritative record of one crawl run
#[derive(Debug, Clone)]
pub struct CrawlJob {
    id: JobId,
    seed_url: String,
    max_pages: usize,
    status: JobStatus,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    links_found: usize,
    current_url: Option<String>,
    crawled_urls: Vec<String>,
    crawling_urls: Vec<String>,
    page_records: HashMap<String, PageRecord>,
    errors: Vec<ErrorEntry>,
    stop_reason: Option<StopReason>,
}

impl CrawlJob {
    /// Creates a job in the `queued` state
    pub fn new(id: JobId, seed_url: impl Into<String>, max_pages: usize) -> Self {
        Self {
            id,
            seed_url: seed_url.into(),
            max_pages,
            status: JobStatus::Queued,
            start_time: None,
            end_time: None,
            links_found: 0,
            current_url: None,
            crawled_urls: Vec::new(),
            crawling_urls: Vec::new(),
            page_records: HashMap::new(),
            errors: Vec::new(),
            stop_reason: None,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn seed_url(&self) -> &str {
        &self.seed_url
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    pub fn pages_crawled(&self) -> usize {
        self.crawled_urls.len()
    }

    pub fn links_found(&self) -> usize {
        self.links_found
    }

    pub fn crawled_urls(&self) -> &[String] {
        &self.crawled_urls
    }

    pub fn crawling_urls(&self) -> &[String] {
        &self.crawling_urls
    }

    pub fn page_records(&self) -> &HashMap<String, PageRecord> {
        &self.page_records
    }

    pub fn errors(&self) -> &[ErrorEntry] {
        &self.errors
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    /// Moves the job from `queued` to `in_progress`
    ///
    /// Fails if the job was already started, which is how a second run of the
    /// same job is refused.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), CrawlError> {
        self.transition(JobStatus::InProgress)?;
        self.start_time = Some(now);
        Ok(())
    }

    /// Records that a fetch of `url` has been dispatched
    pub fn mark_crawling(&mut self, url: &str) {
        if !self.crawling_urls.iter().any(|u| u == url) {
            self.crawling_urls.push(url.to_string());
        }
        self.current_url = Some(url.to_string());
    }

    /// Records a successful fetch: the URL moves from in-flight to crawled
    pub fn record_success(&mut self, url: &str, record: PageRecord) {
        self.release(url);
        if self.page_records.contains_key(url) {
            tracing::warn!("Ignoring duplicate page record for {}", url);
            return;
        }
        self.crawled_urls.push(url.to_string());
        self.page_records.insert(url.to_string(), record);
    }

    /// Records a failed fetch: the URL moves from in-flight to the error list
    pub fn record_failure(&mut self, url: &str, message: impl Into<String>, at: DateTime<Utc>) {
        self.release(url);
        self.errors.push(ErrorEntry {
            url: url.to_string(),
            message: message.into(),
            timestamp: at.timestamp(),
        });
    }

    /// Updates the count of distinct URLs discovered so far
    pub fn set_links_found(&mut self, links_found: usize) {
        self.links_found = links_found;
    }

    /// Moves the job to `completed`
    pub fn complete(&mut self, reason: StopReason, now: DateTime<Utc>) -> Result<(), CrawlError> {
        self.transition(JobStatus::Completed)?;
        self.stop_reason = Some(reason);
        self.finish(now);
        Ok(())
    }

    /// Moves the job to `failed`
    pub fn fail(&mut self, now: DateTime<Utc>) -> Result<(), CrawlError> {
        self.transition(JobStatus::Failed)?;
        self.finish(now);
        Ok(())
    }

    /// Returns a point-in-time copy for external readers
    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            job_id: self.id,
            seed_url: self.seed_url.clone(),
            max_pages: self.max_pages,
            status: self.status,
            links_found: self.links_found,
            pages_crawled: self.pages_crawled(),
            current_url: self.current_url.clone(),
            crawled_urls: self.crawled_urls.clone(),
            crawling_urls: self.crawling_urls.clone(),
            start_time: self.start_time.map(|t| t.timestamp()),
            end_time: self.end_time.map(|t| t.timestamp()),
            stop_reason: self.stop_reason,
            errors: self.errors.clone(),
        }
    }

    fn release(&mut self, url: &str) {
        self.crawling_urls.retain(|u| u != url);
        if self.current_url.as_deref() == Some(url) {
            self.current_url = None;
        }
    }

    fn finish(&mut self, now: DateTime<Utc>) {
        self.end_time = Some(now);
        self.current_url = None;
        self.crawling_urls.clear();
    }

    fn transition(&mut self, to: JobStatus) -> Result<(), CrawlError> {
        let allowed = matches!(
            (self.status, to),
            (JobStatus::Queued, JobStatus::InProgress)
                | (JobStatus::Queued, JobStatus::Failed)
                | (JobStatus::InProgress, JobStatus::Completed)
                | (JobStatus::InProgress, JobStatus::Failed)
        );

        if !allowed {
            return Err(CrawlError::InvalidTransition {
                from: self.status,
                to,
            });
        }

        tracing::debug!("Job {}: {} -> {}", self.id, self.status, to);
        self.status = to;
        Ok(())
    }
}

/// Read-only view of a job, as served to status pollers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub job_id: JobId,
    pub seed_url: String,
    pub max_pages: usize,
    pub status: JobStatus,
    pub links_found: usize,
    pub pages_crawled: usize,
    pub current_url: Option<String>,
    pub crawled_urls: Vec<String>,
    pub crawling_urls: Vec<String>,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub stop_reason: Option<StopReason>,
    pub errors: Vec<ErrorEntry>,
}
