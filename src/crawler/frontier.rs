//! Breadth-first URL frontier for a single crawl
//!
//! The frontier owns the FIFO queue of URLs waiting to be fetched and the set of
//! every canonical key the crawl has seen. It is created per job, used only by
//! the engine loop, and dropped with it.

use crate::url::{canonical_key, normalize_url, CrawlScope};
use std::collections::{HashSet, VecDeque};
use url::Url;

/// A URL waiting in the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedUrl {
    /// Normalized URL to fetch
    pub url: Url,

    /// Canonical key used for deduplication and reporting
    pub key: String,
}

/// Outcome of offering a URL to the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    /// Newly discovered and enqueued
    Added,

    /// Newly discovered but not on the crawl's site; counted, never fetched
    OutOfScope,

    /// Already seen
    Duplicate,

    /// Dropped because the discovered-link ceiling was reached
    Overflow,

    /// Not a crawlable URL
    Rejected,
}

/// Outcome of asking the frontier for work
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Take {
    /// The next URL to fetch
    Ready(QueuedUrl),

    /// Queue is empty but fetches are still in flight and may discover more
    Pending,

    /// Queue is empty and nothing is in flight
    Exhausted,
}

/// FIFO frontier with deduplication and scope filtering
#[derive(Debug)]
pub struct Frontier {
    scope: CrawlScope,
    queue: VecDeque<QueuedUrl>,
    seen: HashSet<String>,
    ceiling: usize,
}

impl Frontier {
    /// Creates an empty frontier
    ///
    /// `ceiling` bounds the number of distinct URLs the crawl may discover.
    pub fn new(scope: CrawlScope, ceiling: usize) -> Self {
        Self {
            scope,
            queue: VecDeque::new(),
            seen: HashSet::new(),
            ceiling: ceiling.max(1),
        }
    }

    /// Enqueues the crawl's seed
    ///
    /// The seed is admitted even when its path looks like a download area,
    /// since the caller asked for it explicitly.
    pub fn seed(&mut self, url: Url) -> QueuedUrl {
        let key = canonical_key(&url);
        self.seen.insert(key.clone());
        let seed = QueuedUrl { url, key };
        self.queue.push_back(seed.clone());
        seed
    }

    /// Offers a raw URL, resolved against `base` when it is relative
    pub fn offer(&mut self, raw: &str, base: Option<&Url>) -> Offer {
        let url = match normalize_url(raw, base) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!("Rejected link {}: {}", raw, e);
                return Offer::Rejected;
            }
        };

        let key = canonical_key(&url);
        if self.seen.contains(&key) {
            return Offer::Duplicate;
        }

        if self.seen.len() >= self.ceiling {
            tracing::debug!("Link ceiling {} reached, dropping {}", self.ceiling, key);
            return Offer::Overflow;
        }

        self.seen.insert(key.clone());

        if !self.scope.admits(&url) {
            tracing::debug!("Out of scope: {}", key);
            return Offer::OutOfScope;
        }

        self.queue.push_back(QueuedUrl { url, key });
        Offer::Added
    }

    /// Removes the earliest-offered URL
    ///
    /// `in_flight` is the number of fetches the caller still has running; it
    /// decides between `Pending` and `Exhausted` when the queue is empty.
    pub fn take(&mut self, in_flight: usize) -> Take {
        match self.queue.pop_front() {
            Some(next) => Take::Ready(next),
            None if in_flight > 0 => Take::Pending,
            None => Take::Exhausted,
        }
    }

    /// Number of distinct URLs discovered so far, in scope or not
    pub fn links_found(&self) -> usize {
        self.seen.len()
    }

    /// Number of URLs waiting to be fetched
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
