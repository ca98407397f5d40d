//! Page loading over HTTP
//!
//! This module performs the single-attempt part of fetching a page:
//! - Building HTTP clients with proper user agent strings
//! - GET requests following redirects
//! - Content-Type checks
//! - Error classification into retryable and permanent attempts
//!
//! Retries and timeouts live one level up, in the fetcher.

use crate::config::UserAgentConfig;
use reqwest::{redirect::Policy, Client};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Maximum redirect hops followed for one request
const MAX_REDIRECTS: usize = 10;

/// Why a single load attempt failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptError {
    #[error("timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("HTTP status {0}")]
    HttpStatus(u16),

    #[error("unsupported content type: {0}")]
    NotHtml(String),

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("request failed: {0}")]
    Request(String),
}

impl AttemptError {
    /// Returns true if another attempt could succeed
    ///
    /// | Condition | Retryable |
    /// |-----------|-----------|
    /// | Timeout, connection failure, body read failure | yes |
    /// | HTTP 5xx, 408, 429 | yes |
    /// | Other HTTP 4xx | no |
    /// | Non-HTML content | no |
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::Connect(_) | Self::Body(_) | Self::Request(_) => true,
            Self::HttpStatus(code) => *code >= 500 || *code == 408 || *code == 429,
            Self::NotHtml(_) => false,
        }
    }
}

/// A page body as delivered by a loader
#[derive(Debug, Clone)]
pub struct LoadedPage {
    /// URL the content was served from, after redirects
    pub final_url: Url,

    /// Raw HTML
    pub html: String,
}

/// Something that can turn a URL into HTML
///
/// The engine only depends on this trait, so tests can crawl scripted
/// in-memory sites and the HTTP client stays swappable.
pub trait PageLoader: Send + Sync + 'static {
    /// Performs one load attempt
    fn load(&self, url: &Url) -> impl Future<Output = Result<LoadedPage, AttemptError>> + Send;
}

/// Builds an HTTP client with proper configuration
///
/// No overall request timeout is set here; every attempt is bounded by the
/// fetcher's per-attempt timeout instead.
///
/// # Example
///
/// ```
/// use site_corpus::config::UserAgentConfig;
/// use site_corpus::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     name: "CorpusBot".to_string(),
///     version: "1.0".to_string(),
///     contact_url: "https://example.com/bot".to_string(),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Loads pages with a `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpLoader {
    client: Client,
}

impl HttpLoader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a loader whose client identifies itself with `config`
    pub fn from_config(config: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config)?))
    }
}

impl PageLoader for HttpLoader {
    async fn load(&self, url: &Url) -> Result<LoadedPage, AttemptError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(classify_request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AttemptError::HttpStatus(status.as_u16()));
        }

        // A missing header is given the benefit of the doubt
        if let Some(content_type) = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            if !is_html_content_type(content_type) {
                return Err(AttemptError::NotHtml(content_type.to_string()));
            }
        }

        let final_url = response.url().clone();
        let html = response
            .text()
            .await
            .map_err(|e| AttemptError::Body(e.to_string()))?;

        Ok(LoadedPage { final_url, html })
    }
}

fn is_html_content_type(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.contains("text/html") || content_type.contains("application/xhtml")
}

fn classify_request_error(error: reqwest::Error) -> AttemptError {
    if error.is_timeout() {
        AttemptError::Timeout
    } else if error.is_connect() {
        AttemptError::Connect(error.to_string())
    } else if let Some(status) = error.status() {
        AttemptError::HttpStatus(status.as_u16())
    } else {
        AttemptError::Request(error.to_string())
    }
}
