//! State module for tracking crawl jobs
//!
//! # Components
//!
//! - `CrawlJob`: the live record of one crawl (status, counters, URL lists, page records, errors)
//! - `JobSnapshot`: the read-only copy served to status pollers
//! - `JobRegistry` / `JobHandle`: process-wide job lookup and per-job shared state

mod job_state;
mod registry;

pub use job_state::{
    CrawlJob, ErrorEntry, JobId, JobSnapshot, JobStatus, PageRecord, StopReason,
};
pub use registry::{JobHandle, JobRegistry};
