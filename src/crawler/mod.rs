//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - Page loading over HTTP, behind the `PageLoader` trait
//! - Per-URL retry policy and content extraction
//! - HTML parsing and link extraction
//! - The breadth-first frontier
//! - The engine that drives a job to completion

mod engine;
mod fetcher;
mod frontier;
mod loader;
mod parser;

pub use engine::CrawlEngine;
pub use fetcher::{FetchError, PageFetcher, PageResult, RetryPolicy};
pub use frontier::{Frontier, Offer, QueuedUrl, Take};
pub use loader::{build_http_client, AttemptError, HttpLoader, LoadedPage, PageLoader};
pub use parser::{parse_html, ParsedPage};
