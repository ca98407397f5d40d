//! Job queue and the worker that drains it
//!
//! Submitted jobs travel over an unbounded `mpsc` channel to a single worker
//! task. The worker spawns one engine run per job; all runs share the engine's
//! fetch slots. After a run the worker publishes the corpus to storage and,
//! when configured, to a JSON file.

use crate::crawler::{CrawlEngine, PageLoader};
use crate::output::{write_corpus_json, CorpusBuilder};
use crate::service::SharedStore;
use crate::state::{JobHandle, JobStatus, StopReason};
use crate::storage::JobSummary;
use crate::CrawlError;
use std::path::{Path, PathBuf};
use std::sync::PoisonError;
use tokio::sync::mpsc;

/// Sending side of the job queue
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::UnboundedSender<JobHandle>,
}

impl JobQueue {
    /// Hands a registered job to the worker
    pub fn submit(&self, job: JobHandle) -> Result<(), CrawlError> {
        self.tx.send(job).map_err(|_| CrawlError::QueueClosed)
    }
}

/// Receiving side of the job queue
pub struct Worker<L> {
    engine: CrawlEngine<L>,
    store: SharedStore,
    json_dir: Option<PathBuf>,
    rx: mpsc::UnboundedReceiver<JobHandle>,
}

/// Creates a connected queue and worker
pub fn channel<L: PageLoader>(
    engine: CrawlEngine<L>,
    store: SharedStore,
    json_dir: Option<PathBuf>,
) -> (JobQueue, Worker<L>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        JobQueue { tx },
        Worker {
            engine,
            store,
            json_dir,
            rx,
        },
    )
}

impl<L: PageLoader> Worker<L> {
    /// Runs until every `JobQueue` clone has been dropped
    pub async fn run(mut self) {
        tracing::info!("Crawl worker started");

        while let Some(job) = self.rx.recv().await {
            let engine = self.engine.clone();
            let store = SharedStore::clone(&self.store);
            let json_dir = self.json_dir.clone();

            tokio::spawn(async move {
                // Errors are already recorded on the job and logged
                let _ = run_job(&engine, &store, json_dir.as_deref(), &job).await;
            });
        }

        tracing::info!("Crawl worker stopped");
    }
}

/// Runs one job and publishes its corpus
///
/// A job that was already started elsewhere is ignored, so a duplicate
/// submission never produces a second run.
pub async fn run_job<L: PageLoader>(
    engine: &CrawlEngine<L>,
    store: &SharedStore,
    json_dir: Option<&Path>,
    job: &JobHandle,
) -> Result<StopReason, CrawlError> {
    let result = engine.run(job).await;

    if let Err(CrawlError::InvalidTransition { from, .. }) = &result {
        tracing::debug!("Job {} already {}, ignoring duplicate run", job.id(), from);
        return result;
    }

    if job.read(|j| j.status()) == JobStatus::Completed {
        publish(store, json_dir, job);
    }

    result
}

fn publish(store: &SharedStore, json_dir: Option<&Path>, job: &JobHandle) {
    let corpus = job.read(CorpusBuilder::build);
    let summary = JobSummary::from(&job.snapshot());

    let saved = store
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .save_corpus(&summary, &corpus);
    if let Err(e) = saved {
        tracing::error!("Failed to store corpus of job {}: {}", summary.job_id, e);
    }

    if let Some(dir) = json_dir {
        if let Err(e) = write_corpus_json(dir, summary.job_id, &corpus) {
            tracing::error!("Failed to export corpus of job {}: {}", summary.job_id, e);
        }
    }
}
