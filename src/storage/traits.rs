//! Storage traits and error types
//!
//! This module defines the trait interface for corpus storage backends and
//! associated error types.

use crate::state::{JobId, PageRecord};
use crate::storage::JobSummary;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for corpus storage backends
///
/// A stored corpus is keyed by job id and consists of the job's summary row
/// plus its page records in crawl order.
pub trait CorpusStore {
    /// Stores the corpus of a finished job, replacing any earlier one for the same id
    fn save_corpus(&mut self, summary: &JobSummary, pages: &[PageRecord]) -> StorageResult<()>;

    /// Loads the page records of a job in crawl order
    ///
    /// Returns `Ok(None)` when no corpus was stored for the id; a stored corpus
    /// may still be empty.
    fn load_corpus(&self, job_id: JobId) -> StorageResult<Option<Vec<PageRecord>>>;

    /// Loads the summary row of a job
    fn load_summary(&self, job_id: JobId) -> StorageResult<Option<JobSummary>>;

    /// Removes a stored corpus; returns false if there was none
    fn delete_corpus(&mut self, job_id: JobId) -> StorageResult<bool>;
}
