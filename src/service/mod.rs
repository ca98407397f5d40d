//! Crawl service: the operations shared by the HTTP API and the CLI
//!
//! `CrawlService` ties the job registry, the job queue and corpus storage
//! together. Live jobs are answered from the registry; finished corpora of
//! purged jobs or earlier processes are answered from storage.

mod queue;

pub use queue::{channel, run_job, JobQueue, Worker};

use crate::config::Config;
use crate::crawler::{CrawlEngine, PageLoader};
use crate::output::{CorpusBuilder, FilteredCorpus};
use crate::state::{JobId, JobRegistry, JobSnapshot, JobStatus, PageRecord};
use crate::storage::CorpusStore;
use crate::url::normalize_url;
use crate::CrawlError;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

/// Corpus storage shared between the service and its worker
pub type SharedStore = Arc<Mutex<dyn CorpusStore + Send>>;

pub struct CrawlService {
    registry: Arc<JobRegistry>,
    queue: JobQueue,
    store: SharedStore,
    default_max_pages: usize,
}

impl CrawlService {
    pub fn new(
        registry: Arc<JobRegistry>,
        queue: JobQueue,
        store: SharedStore,
        default_max_pages: usize,
    ) -> Self {
        Self {
            registry,
            queue,
            store,
            default_max_pages,
        }
    }

    /// Builds the service and spawns its worker on the current runtime
    pub fn start<L: PageLoader>(loader: L, store: SharedStore, config: &Config) -> Arc<Self> {
        let engine = CrawlEngine::new(loader, &config.crawler);
        let json_dir = Some(config.output.json_dir.as_str())
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from);

        let (queue, worker) = channel(engine, SharedStore::clone(&store), json_dir);
        tokio::spawn(worker.run());

        Arc::new(Self::new(
            Arc::new(JobRegistry::new()),
            queue,
            store,
            config.crawler.default_max_pages,
        ))
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Registers a crawl of `seed_url` and queues it
    ///
    /// `max_pages` falls back to the configured default and must be at least 1.
    pub fn submit(&self, seed_url: &str, max_pages: Option<usize>) -> Result<JobSnapshot, CrawlError> {
        let seed = normalize_url(seed_url, None)?;

        let max_pages = max_pages.unwrap_or(self.default_max_pages);
        if max_pages == 0 {
            return Err(CrawlError::InvalidRequest(
                "max_pages must be at least 1".to_string(),
            ));
        }

        let job = self.registry.create(seed.as_str(), max_pages);
        self.queue.submit(job.clone())?;
        tracing::info!("Queued job {} for {} (max {} pages)", job.id(), seed, max_pages);

        Ok(job.snapshot())
    }

    pub fn status(&self, job_id: JobId) -> Result<JobSnapshot, CrawlError> {
        self.registry.snapshot(job_id)
    }

    /// Requests cancellation and returns the job's current snapshot
    pub fn cancel(&self, job_id: JobId) -> Result<JobSnapshot, CrawlError> {
        let job = self
            .registry
            .get(job_id)
            .ok_or(CrawlError::JobNotFound(job_id))?;
        job.cancel();
        tracing::info!("Cancellation requested for job {}", job_id);
        Ok(job.snapshot())
    }

    /// Returns the corpus of a completed job
    pub fn output(&self, job_id: JobId) -> Result<Vec<PageRecord>, CrawlError> {
        if let Some(job) = self.registry.get(job_id) {
            match job.read(|j| j.status()) {
                JobStatus::Completed => return Ok(job.read(CorpusBuilder::build)),
                JobStatus::Queued | JobStatus::InProgress => {
                    return Err(CrawlError::OutputNotReady(job_id))
                }
                JobStatus::Failed => return Err(CrawlError::OutputNotFound(job_id)),
            }
        }

        self.store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .load_corpus(job_id)?
            .ok_or(CrawlError::OutputNotFound(job_id))
    }

    /// Returns the records of a completed job matching `urls`
    pub fn filtered_output(
        &self,
        job_id: JobId,
        urls: &[String],
    ) -> Result<FilteredCorpus, CrawlError> {
        let corpus = self.output(job_id)?;
        Ok(CorpusBuilder::filter(job_id, &corpus, urls))
    }

    /// Drops a job from the registry; a stored corpus stays available
    pub fn purge(&self, job_id: JobId) -> Result<(), CrawlError> {
        if self.registry.purge(job_id) {
            Ok(())
        } else {
            Err(CrawlError::JobNotFound(job_id))
        }
    }
}
