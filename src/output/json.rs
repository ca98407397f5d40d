//! JSON export of finished corpora

use crate::state::{JobId, PageRecord};
use crate::CrawlError;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes `corpus` as a pretty-printed JSON array to `path`, creating parent directories
pub fn write_json_file(path: &Path, corpus: &[PageRecord]) -> Result<(), CrawlError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(corpus)?;
    fs::write(path, json)?;
    Ok(())
}

/// Exports a job's corpus to `<dir>/<job_id>.json` and returns the file path
pub fn write_corpus_json(
    dir: &Path,
    job_id: JobId,
    corpus: &[PageRecord],
) -> Result<PathBuf, CrawlError> {
    let path = dir.join(format!("{}.json", job_id));
    write_json_file(&path, corpus)?;
    tracing::info!("Wrote corpus of job {} to {}", job_id, path.display());
    Ok(path)
}
