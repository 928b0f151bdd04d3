//! The recurring indexing jobs.
//!
//! - **full_corpus_index**: every enabled area from its cursor, under a
//!   time limit
//! - **index_requests**: drains the reindex request queue, under a time
//!   limit
//!
//! Both run the blocking indexing core on `spawn_blocking`. A run that
//! finds the storage lease held by another process logs and succeeds.

pub mod indexing;
pub mod requests;

use std::time::Duration;

pub use indexing::{create_full_index_job, run_full_index, FullIndexJobConfig, FULL_INDEX_JOB};
pub use requests::{create_request_job, run_request_processing, RequestJobConfig, REQUEST_JOB};

fn time_limit(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
