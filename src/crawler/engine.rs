//! Crawl engine: drives one job from its seed to a terminal state
//!
//! The engine owns the job's frontier and is the only writer of its state. Page
//! fetches run as tasks in a `JoinSet`, each holding a permit from the slot
//! semaphore; they return their outcome and never touch job state themselves.
//!
//! # Loop
//!
//! 1. Holding a slot, take the next URL and dispatch it right away, so a URL
//!    is always either queued in the frontier or listed as crawling
//! 2. Wait for whichever comes first: a free slot while the frontier has work
//!    and the page budget has room, a finished fetch, or a cancellation request
//! 3. Stop once no slot is wanted and nothing is in flight

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{FetchError, PageFetcher, PageResult, RetryPolicy};
use crate::crawler::frontier::{Frontier, Offer, QueuedUrl, Take};
use crate::crawler::loader::PageLoader;
use crate::state::{JobHandle, PageRecord, StopReason};
use crate::url::{canonical_key, normalize_url, CrawlScope};
use crate::CrawlError;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;

type FetchOutcome = (QueuedUrl, Result<PageResult, FetchError>);

/// Runs crawl jobs against a page loader
pub struct CrawlEngine<L> {
    fetcher: Arc<PageFetcher<L>>,
    slots: Arc<Semaphore>,
    config: CrawlerConfig,
}

impl<L> Clone for CrawlEngine<L> {
    fn clone(&self) -> Self {
        Self {
            fetcher: Arc::clone(&self.fetcher),
            slots: Arc::clone(&self.slots),
            config: self.config.clone(),
        }
    }
}

impl<L: PageLoader> CrawlEngine<L> {
    /// Creates an engine with `config.concurrency` fetch slots
    ///
    /// Clones of the engine share the same slots, so every job run through
    /// them competes for one pool.
    pub fn new(loader: L, config: &CrawlerConfig) -> Self {
        Self {
            fetcher: Arc::new(PageFetcher::new(loader, RetryPolicy::from_config(config))),
            slots: Arc::new(Semaphore::new(config.concurrency.max(1))),
            config: config.clone(),
        }
    }

    /// Crawls `job` to completion
    ///
    /// The job must be `queued`; a job that was already started is refused with
    /// [`CrawlError::InvalidTransition`] and left untouched. On return the job is
    /// `completed` or `failed`.
    pub async fn run(&self, job: &JobHandle) -> Result<StopReason, CrawlError> {
        let (job_id, seed_raw, max_pages) =
            job.read(|j| (j.id(), j.seed_url().to_string(), j.max_pages()));

        job.update(|j| j.start(Utc::now()))?;
        tracing::info!("Job {}: crawling {} (max {} pages)", job_id, seed_raw, max_pages);

        let (seed, scope) = match normalize_url(&seed_raw, None)
            .and_then(|seed| CrawlScope::for_seed(&seed).map(|scope| (seed, scope)))
        {
            Ok(parts) => parts,
            Err(e) => {
                let message = format!("Crawl aborted, invalid seed URL: {}", e);
                return Err(abort(job, &seed_raw, message, e.into()));
            }
        };
        let seed_key = canonical_key(&seed);

        let mut frontier = Frontier::new(scope, self.config.link_ceiling(max_pages));
        frontier.seed(seed);
        job.update(|j| j.set_links_found(frontier.links_found()));

        let mut cancel = job.cancellation();
        let mut cancelled = *cancel.borrow();
        let mut watching = true;

        let mut tasks: JoinSet<FetchOutcome> = JoinSet::new();
        let mut slot: Option<OwnedSemaphorePermit> = None;
        let mut fatal: Option<CrawlError> = None;

        loop {
            let open = !cancelled
                && fatal.is_none()
                && job.read(|j| j.pages_crawled()) + tasks.len() < max_pages;

            if let Some(permit) = slot.take() {
                if open {
                    if let Take::Ready(next) = frontier.take(tasks.len()) {
                        job.update(|j| j.mark_crawling(&next.key));
                        tracing::debug!("Job {}: dispatching {}", job_id, next.key);

                        let fetcher = Arc::clone(&self.fetcher);
                        tasks.spawn(async move {
                            let _permit = permit;
                            let result = fetcher.fetch(&next.url).await;
                            (next, result)
                        });
                        continue;
                    }
                }
            }

            let wants_slot = open && !frontier.is_empty();
            if !wants_slot && tasks.is_empty() {
                break;
            }

            tokio::select! {
                permit = Arc::clone(&self.slots).acquire_owned(), if wants_slot => {
                    match permit {
                        Ok(permit) => slot = Some(permit),
                        Err(_) => {
                            tracing::error!("Job {}: fetch slots closed, stopping", job_id);
                            cancelled = true;
                        }
                    }
                }

                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    match joined {
                        Ok((done, result)) => {
                            if let Some(err) = settle(job, &mut frontier, &seed_key, done, result) {
                                fatal = Some(err);
                            }
                        }
                        Err(e) => tracing::error!("Job {}: fetch task failed: {}", job_id, e),
                    }
                }

                changed = cancel.changed(), if watching && !cancelled => {
                    match changed {
                        Ok(()) => {
                            let requested = *cancel.borrow();
                            if requested {
                                tracing::info!(
                                    "Job {}: cancellation requested, draining {} fetches",
                                    job_id,
                                    tasks.len()
                                );
                                cancelled = true;
                            }
                        }
                        Err(_) => watching = false,
                    }
                }
            }
        }

        let now = Utc::now();

        if let Some(err) = fatal {
            job.update(|j| j.fail(now))?;
            tracing::error!("Job {}: {}", job_id, err);
            return Err(err);
        }

        let pages_crawled = job.read(|j| j.pages_crawled());
        let reason = if cancelled {
            StopReason::Cancelled
        } else if pages_crawled >= max_pages {
            StopReason::PageBudget
        } else {
            StopReason::FrontierExhausted
        };

        job.update(|j| j.complete(reason, now))?;
        tracing::info!(
            "Job {}: completed ({:?}), {} pages crawled, {} links found",
            job_id,
            reason,
            pages_crawled,
            frontier.links_found()
        );

        Ok(reason)
    }
}

/// Applies one finished fetch to the job and frontier
///
/// Returns the fatal error when the seed fails before any page was crawled.
fn settle(
    job: &JobHandle,
    frontier: &mut Frontier,
    seed_key: &str,
    done: QueuedUrl,
    result: Result<PageResult, FetchError>,
) -> Option<CrawlError> {
    match result {
        Ok(page) => {
            let added = page
                .outbound_links
                .iter()
                .filter(|link| frontier.offer(link, None) == Offer::Added)
                .count();
            tracing::debug!(
                "Crawled {}: {} links, {} new in scope",
                done.key,
                page.outbound_links.len(),
                added
            );

            let record = PageRecord {
                title: page.title,
                url: done.key.clone(),
                text: page.text,
            };
            let links_found = frontier.links_found();
            job.update(|j| {
                j.record_success(&done.key, record);
                j.set_links_found(links_found);
            });
            None
        }
        Err(err) => {
            let seed_failed = done.key == seed_key && job.read(|j| j.pages_crawled()) == 0;
            if !seed_failed {
                job.update(|j| j.record_failure(&done.key, err.message(), err.at()));
                return None;
            }

            let message = format!("Crawl aborted, seed URL unreachable: {}", err.message());
            job.update(|j| j.record_failure(&done.key, message, err.at()));
            Some(CrawlError::SeedUnreachable {
                url: done.key,
                message: err.message().to_string(),
            })
        }
    }
}

/// Records a single error for `url` and fails the job
fn abort(job: &JobHandle, url: &str, message: String, cause: CrawlError) -> CrawlError {
    let now = Utc::now();
    job.update(|j| {
        j.record_failure(url, message, now);
        if let Err(e) = j.fail(now) {
            tracing::error!("Job {}: {}", j.id(), e);
        }
    });
    cause
}
