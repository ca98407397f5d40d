//! Corpus assembly and filtering

use crate::state::{CrawlJob, JobId, PageRecord};
use crate::url::{canonical_key, normalize_url};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Records matching a filter request, plus the requested URLs that matched nothing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredCorpus {
    pub job_id: JobId,
    pub filtered_data: Vec<PageRecord>,
    pub missing_urls: Vec<String>,
}

/// Builds and filters corpora; holds no state
pub struct CorpusBuilder;

impl CorpusBuilder {
    /// Returns the job's page records in crawl order
    pub fn build(job: &CrawlJob) -> Vec<PageRecord> {
        job.crawled_urls()
            .iter()
            .filter_map(|url| job.page_records().get(url).cloned())
            .collect()
    }

    /// Selects records for `requested`, keeping the request order
    ///
    /// A requested URL matches a record whose URL is identical or equal to the
    /// requested URL's canonical form, so `https://example.com/docs/` finds the
    /// record for `https://example.com/docs`.
    pub fn filter(job_id: JobId, corpus: &[PageRecord], requested: &[String]) -> FilteredCorpus {
        let by_url: HashMap<&str, &PageRecord> =
            corpus.iter().map(|record| (record.url.as_str(), record)).collect();

        let mut filtered_data = Vec::new();
        let mut missing_urls = Vec::new();

        for url in requested {
            let found = by_url.get(url.as_str()).copied().or_else(|| {
                normalize_url(url, None)
                    .ok()
                    .and_then(|normalized| by_url.get(canonical_key(&normalized).as_str()).copied())
            });

            match found {
                Some(record) => filtered_data.push(record.clone()),
                None => missing_urls.push(url.clone()),
            }
        }

        FilteredCorpus {
            job_id,
            filtered_data,
            missing_urls,
        }
    }
}
