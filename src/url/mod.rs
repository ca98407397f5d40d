//! URL handling module for site-corpus
//!
//! This module provides URL normalization, canonical frontier keys, domain
//! extraction, and the scope rules that keep a crawl on its seed's site.

mod domain;
mod normalize;

pub use domain::{extract_domain, is_download_link, registrable_domain, CrawlScope};
pub use normalize::{canonical_key, normalize_url};
