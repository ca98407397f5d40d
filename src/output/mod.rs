//! Output module for publishing crawl results
//!
//! This module handles:
//! - Assembling a job's corpus in crawl order
//! - Filtering a corpus down to requested URLs
//! - Exporting corpora as JSON files

mod corpus;
mod json;

pub use corpus::{CorpusBuilder, FilteredCorpus};
pub use json::{write_corpus_json, write_json_file};
