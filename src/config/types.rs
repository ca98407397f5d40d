use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for site-corpus
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    pub server: ServerConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Number of page fetches a single job may have in flight
    pub concurrency: usize,

    /// Page budget used when a submission does not name one
    pub default_max_pages: usize,

    /// Attempts per URL before the fetch is reported as failed
    pub max_attempts: u32,

    /// Timeout applied to every individual fetch attempt (seconds)
    pub attempt_timeout_secs: u64,

    /// Pause between two attempts on the same URL (milliseconds)
    pub retry_backoff_ms: u64,

    /// Discovered-link ceiling, as a multiple of the job's page budget
    pub link_ceiling_factor: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            concurrency: 5,
            default_max_pages: 10,
            max_attempts: 3,
            attempt_timeout_secs: 30,
            retry_backoff_ms: 2000,
            link_ceiling_factor: 10,
        }
    }
}

impl CrawlerConfig {
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.attempt_timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// Maximum number of distinct URLs a job with `max_pages` may discover
    pub fn link_ceiling(&self, max_pages: usize) -> usize {
        max_pages.saturating_mul(self.link_ceiling_factor).max(1)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct UserAgentConfig {
    /// Name of the crawler
    pub name: String,

    /// Version of the crawler
    pub version: String,

    /// URL with information about the crawler
    pub contact_url: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            name: "site-corpus".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/site-corpus".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the user agent header: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        format!("{}/{} (+{})", self.name, self.version, self.contact_url)
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path to the SQLite database holding finished corpora
    pub database_path: String,

    /// Directory receiving `<job_id>.json` exports; empty disables the export
    pub json_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: "./site-corpus.db".to_string(),
            json_dir: "./outputs".to_string(),
        }
    }
}

/// HTTP API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ServerConfig {
    /// Socket address the API listens on
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
        }
    }
}
