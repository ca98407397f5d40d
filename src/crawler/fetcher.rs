//! Page fetcher with retry logic
//!
//! Wraps a [`PageLoader`] with the per-URL retry policy and turns the loaded
//! HTML into a [`PageResult`]. Individual failed attempts are only logged;
//! the caller sees a single outcome per URL.

use crate::config::CrawlerConfig;
use crate::crawler::loader::{AttemptError, LoadedPage, PageLoader};
use crate::crawler::parser::parse_html;
use crate::url::canonical_key;
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// How often and how long a URL is tried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub attempt_timeout: Duration,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            attempt_timeout: Duration::from_secs(30),
            backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            attempt_timeout: config.attempt_timeout(),
            backoff: config.retry_backoff(),
        }
    }
}

/// Final failure of a URL
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Every attempt failed with a retryable error
    #[error("{message}")]
    Exhausted {
        message: String,
        attempts: u32,
        at: DateTime<Utc>,
    },

    /// An attempt failed in a way retrying cannot fix
    #[error("{message}")]
    Permanent { message: String, at: DateTime<Utc> },
}

impl FetchError {
    pub fn message(&self) -> &str {
        match self {
            Self::Exhausted { message, .. } | Self::Permanent { message, .. } => message,
        }
    }

    /// Time of the attempt that settled the outcome
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Self::Exhausted { at, .. } | Self::Permanent { at, .. } => *at,
        }
    }
}

/// Content extracted from one successfully fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResult {
    /// Page title, or the URL when the page has none
    pub title: String,

    /// Canonical key of the requested URL
    pub url: String,

    /// Main text with whitespace collapsed
    pub text: String,

    /// Absolute links found on the page
    pub outbound_links: Vec<String>,
}

/// Fetches pages through a loader, applying a [`RetryPolicy`]
#[derive(Debug)]
pub struct PageFetcher<L> {
    loader: L,
    policy: RetryPolicy,
}

impl<L: PageLoader> PageFetcher<L> {
    pub fn new(loader: L, policy: RetryPolicy) -> Self {
        Self { loader, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetches `url`, retrying transient failures
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | Attempt exceeds `attempt_timeout` | Retry after `backoff` |
    /// | Retryable [`AttemptError`] | Retry after `backoff` |
    /// | Other [`AttemptError`] | Immediate `Permanent` |
    /// | `max_attempts` used up | `Exhausted` |
    pub async fn fetch(&self, url: &Url) -> Result<PageResult, FetchError> {
        let key = canonical_key(url);
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let outcome = tokio::time::timeout(self.policy.attempt_timeout, self.loader.load(url))
                .await
                .unwrap_or(Err(AttemptError::Timeout));

            let error = match outcome {
                Ok(page) => return Ok(extract(&key, page)),
                Err(error) => error,
            };

            let message = failure_message(&key, &error, attempt, max_attempts);

            if !error.is_retryable() {
                tracing::warn!("{}", message);
                return Err(FetchError::Permanent {
                    message,
                    at: Utc::now(),
                });
            }

            if attempt >= max_attempts {
                tracing::warn!("{}", message);
                return Err(FetchError::Exhausted {
                    message,
                    attempts: attempt,
                    at: Utc::now(),
                });
            }

            tracing::warn!("{}, retrying", message);
            attempt += 1;

            if !self.policy.backoff.is_zero() {
                tokio::time::sleep(self.policy.backoff).await;
            }
        }
    }
}

fn failure_message(key: &str, error: &AttemptError, attempt: u32, max_attempts: u32) -> String {
    match error {
        AttemptError::Timeout => format!(
            "Timeout while navigating to {} (Attempt {}/{})",
            key, attempt, max_attempts
        ),
        other => format!(
            "Failed to navigate to {}: {} (Attempt {}/{})",
            key, other, attempt, max_attempts
        ),
    }
}

fn extract(key: &str, page: LoadedPage) -> PageResult {
    let parsed = parse_html(&page.html, &page.final_url);

    PageResult {
        title: parsed.title.unwrap_or_else(|| key.to_string()),
        url: key.to_string(),
        text: parsed.text,
        outbound_links: parsed.links,
    }
}
