//! Database schema definitions
//!
//! This module contains the SQL schema for the site-corpus database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One summary row per finished job
CREATE TABLE IF NOT EXISTS jobs (
    job_id TEXT PRIMARY KEY,
    seed_url TEXT NOT NULL,
    max_pages INTEGER NOT NULL,
    status TEXT NOT NULL,
    stop_reason TEXT,
    pages_crawled INTEGER NOT NULL,
    links_found INTEGER NOT NULL,
    errors_json TEXT NOT NULL DEFAULT '[]',
    start_time INTEGER,
    end_time INTEGER,
    saved_at TEXT NOT NULL
);

-- Corpus records, in crawl order
CREATE TABLE IF NOT EXISTS corpus_pages (
    job_id TEXT NOT NULL REFERENCES jobs(job_id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    url TEXT NOT NULL,
    title TEXT NOT NULL,
    text TEXT NOT NULL,
    PRIMARY KEY (job_id, position)
);

CREATE INDEX IF NOT EXISTS idx_corpus_pages_url ON corpus_pages(job_id, url);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
