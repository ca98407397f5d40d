//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the CorpusStore trait.

use crate::state::{JobId, JobStatus, PageRecord, StopReason};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{CorpusStore, StorageError, StorageResult};
use crate::storage::JobSummary;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the database at `path`
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl CorpusStore for SqliteStorage {
    fn save_corpus(&mut self, summary: &JobSummary, pages: &[PageRecord]) -> StorageResult<()> {
        let job_id = summary.job_id.to_string();
        let errors_json = serde_json::to_string(&summary.errors)?;

        let tx = self.conn.transaction()?;

        tx.execute("DELETE FROM corpus_pages WHERE job_id = ?1", params![job_id])?;
        tx.execute(
            "INSERT OR REPLACE INTO jobs
                (job_id, seed_url, max_pages, status, stop_reason, pages_crawled,
                 links_found, errors_json, start_time, end_time, saved_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                job_id,
                summary.seed_url,
                summary.max_pages as i64,
                summary.status.to_db_string(),
                summary.stop_reason.map(|r| r.to_db_string()),
                summary.pages_crawled as i64,
                summary.links_found as i64,
                errors_json,
                summary.start_time,
                summary.end_time,
                Utc::now().to_rfc3339(),
            ],
        )?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO corpus_pages (job_id, position, url, title, text)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for (position, page) in pages.iter().enumerate() {
                stmt.execute(params![job_id, position as i64, page.url, page.title, page.text])?;
            }
        }

        tx.commit()?;
        tracing::debug!("Saved corpus of job {} ({} pages)", job_id, pages.len());
        Ok(())
    }

    fn load_corpus(&self, job_id: JobId) -> StorageResult<Option<Vec<PageRecord>>> {
        let id = job_id.to_string();

        let exists = self
            .conn
            .query_row("SELECT 1 FROM jobs WHERE job_id = ?1", params![id], |_| Ok(()))
            .optional()?
            .is_some();
        if !exists {
            return Ok(None);
        }

        let mut stmt = self.conn.prepare(
            "SELECT url, title, text FROM corpus_pages WHERE job_id = ?1 ORDER BY position",
        )?;
        let pages = stmt
            .query_map(params![id], |row| {
                Ok(PageRecord {
                    url: row.get(0)?,
                    title: row.get(1)?,
                    text: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(pages))
    }

    fn load_summary(&self, job_id: JobId) -> StorageResult<Option<JobSummary>> {
        let row = self
            .conn
            .query_row(
                "SELECT seed_url, max_pages, status, stop_reason, pages_crawled, links_found,
                        errors_json, start_time, end_time
                 FROM jobs WHERE job_id = ?1",
                params![job_id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, i64>(5)?,
                        row.get::<_, String>(6)?,
                        row.get::<_, Option<i64>>(7)?,
                        row.get::<_, Option<i64>>(8)?,
                    ))
                },
            )
            .optional()?;

        let Some((
            seed_url,
            max_pages,
            status,
            stop_reason,
            pages_crawled,
            links_found,
            errors_json,
            start_time,
            end_time,
        )) = row
        else {
            return Ok(None);
        };

        let status = JobStatus::from_db_string(&status)
            .ok_or_else(|| StorageError::Database(format!("Unknown job status: {}", status)))?;

        Ok(Some(JobSummary {
            job_id,
            seed_url,
            max_pages: max_pages as usize,
            status,
            stop_reason: stop_reason.as_deref().and_then(StopReason::from_db_string),
            pages_crawled: pages_crawled as usize,
            links_found: links_found as usize,
            errors: serde_json::from_str(&errors_json)?,
            start_time,
            end_time,
        }))
    }

    fn delete_corpus(&mut self, job_id: JobId) -> StorageResult<bool> {
        let id = job_id.to_string();
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM corpus_pages WHERE job_id = ?1", params![id])?;
        let removed = tx.execute("DELETE FROM jobs WHERE job_id = ?1", params![id])?;
        tx.commit()?;
        Ok(removed > 0)
    }
}
