//! Process-wide registry of crawl jobs
//!
//! Jobs are registered on submission and stay until explicitly purged. Each
//! entry is a [`JobHandle`]: shared, lock-protected job state plus the job's
//! cancellation signal.

use crate::state::{CrawlJob, JobId, JobSnapshot};
use crate::CrawlError;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::watch;

/// Shared handle to one job's state
///
/// The engine running the job is the only writer; everyone else reads through
/// [`JobHandle::snapshot`]. Critical sections are short and never span an await.
#[derive(Clone)]
pub struct JobHandle {
    state: Arc<RwLock<CrawlJob>>,
    cancel_tx: Arc<watch::Sender<bool>>,
}

impl JobHandle {
    pub fn new(job: CrawlJob) -> Self {
        let (cancel_tx, _) = watch::channel(false);
        Self {
            state: Arc::new(RwLock::new(job)),
            cancel_tx: Arc::new(cancel_tx),
        }
    }

    /// Runs `f` with shared access to the job
    pub fn read<R>(&self, f: impl FnOnce(&CrawlJob) -> R) -> R {
        let guard = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    /// Runs `f` with exclusive access to the job
    pub fn update<R>(&self, f: impl FnOnce(&mut CrawlJob) -> R) -> R {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn id(&self) -> JobId {
        self.read(|job| job.id())
    }

    pub fn snapshot(&self) -> JobSnapshot {
        self.read(CrawlJob::snapshot)
    }

    /// Asks the engine running this job to stop dispatching new fetches
    pub fn cancel(&self) {
        self.cancel_tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel_tx.borrow()
    }

    /// Returns a receiver that observes cancellation requests
    pub fn cancellation(&self) -> watch::Receiver<bool> {
        self.cancel_tx.subscribe()
    }
}

/// Maps job identifiers to their live state
#[derive(Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<JobId, JobHandle>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new `queued` job and returns its handle
    pub fn create(&self, seed_url: impl Into<String>, max_pages: usize) -> JobHandle {
        let id = JobId::new();
        let handle = JobHandle::new(CrawlJob::new(id, seed_url, max_pages));
        self.jobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, handle.clone());
        tracing::debug!("Registered job {}", id);
        handle
    }

    pub fn get(&self, id: JobId) -> Option<JobHandle> {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    /// Returns the current snapshot of a job
    pub fn snapshot(&self, id: JobId) -> Result<JobSnapshot, CrawlError> {
        self.get(id)
            .map(|handle| handle.snapshot())
            .ok_or(CrawlError::JobNotFound(id))
    }

    /// Removes a job from the registry; returns false if it was unknown
    pub fn purge(&self, id: JobId) -> bool {
        let removed = self
            .jobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);

        if let Some(handle) = &removed {
            // An engine still holding the handle should stop as well
            handle.cancel();
            tracing::info!("Purged job {}", id);
        }

        removed.is_some()
    }

    pub fn len(&self) -> usize {
        self.jobs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
