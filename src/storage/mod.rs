//! Storage module for persisting finished corpora
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Job summary rows for finished crawls
//! - Ordered corpus records per job

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{CorpusStore, StorageError, StorageResult};

use crate::state::{ErrorEntry, JobId, JobSnapshot, JobStatus, StopReason};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Initializes or opens a storage database
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// Stored summary of a finished job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    pub job_id: JobId,
    pub seed_url: String,
    pub max_pages: usize,
    pub status: JobStatus,
    pub stop_reason: Option<StopReason>,
    pub pages_crawled: usize,
    pub links_found: usize,
    pub errors: Vec<ErrorEntry>,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
}

impl From<&JobSnapshot> for JobSummary {
    fn from(snapshot: &JobSnapshot) -> Self {
        Self {
            job_id: snapshot.job_id,
            seed_url: snapshot.seed_url.clone(),
            max_pages: snapshot.max_pages,
            status: snapshot.status,
            stop_reason: snapshot.stop_reason,
            pages_crawled: snapshot.pages_crawled,
            links_found: snapshot.links_found,
            errors: snapshot.errors.clone(),
            start_time: snapshot.start_time,
            end_time: snapshot.end_time,
        }
    }
}
