//! site-corpus: a bounded website crawler that assembles a text corpus
//!
//! This crate crawls a single site breadth-first from a seed URL, extracts the
//! title and main text of every page it reaches within a page budget, and
//! publishes the result as an ordered corpus. Crawls run as jobs whose live
//! state can be polled while they execute.

pub mod api;
pub mod config;
pub mod crawler;
pub mod output;
pub mod service;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for site-corpus operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Job not found: {0}")]
    JobNotFound(state::JobId),

    #[error("Output for job {0} is not ready yet")]
    OutputNotReady(state::JobId),

    #[error("Output file not found for job {0}")]
    OutputNotFound(state::JobId),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Seed URL {url} is unreachable: {message}")]
    SeedUnreachable { url: String, message: String },

    #[error("Invalid job transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::JobStatus,
        to: state::JobStatus,
    },

    #[error("Job queue is closed")]
    QueueClosed,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for site-corpus operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use state::{CrawlJob, JobId, JobSnapshot, JobStatus, PageRecord};
pub use crate::url::{canonical_key, normalize_url, CrawlScope};
