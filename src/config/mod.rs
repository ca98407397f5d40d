//! Configuration module for site-corpus
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section has defaults, so a missing file section falls back to the values
//! the crawler ships with.
//!
//! # Example
//!
//! ```no_run
//! use site_corpus::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("site-corpus.toml")).unwrap();
//! println!("Crawler will use {} fetch slots", config.crawler.concurrency);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, ServerConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
