//! In-memory status of every registered job.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum JobResult {
    Success,
    Failed(String),
    /// Not run: paused, or the previous run was still active
    Skipped(String),
}

/// Counters a job reports back, e.g. records and documents indexed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobOutput {
    pub metadata: HashMap<String, String>,
}

impl JobOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.metadata.insert(key.into(), value.to_string());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatus {
    pub job_name: String,
    pub cron_expr: String,
    /// Start of the most recent completed or skipped tick
    pub last_run: Option<DateTime<Utc>>,
    pub last_duration_ms: Option<u64>,
    pub last_result: Option<JobResult>,
    pub next_run: Option<DateTime<Utc>>,
    pub run_count: u64,
    pub error_count: u64,
    pub skip_count: u64,
    pub is_running: bool,
    pub is_paused: bool,
    #[serde(default)]
    pub last_run_metadata: HashMap<String, String>,
}

impl JobStatus {
    pub fn new(job_name: impl Into<String>, cron_expr: impl Into<String>) -> Self {
        Self {
            job_name: job_name.into(),
            cron_expr: cron_expr.into(),
            last_run: None,
            last_duration_ms: None,
            last_result: None,
            next_run: None,
            run_count: 0,
            error_count: 0,
            skip_count: 0,
            is_running: false,
            is_paused: false,
            last_run_metadata: HashMap::new(),
        }
    }
}

/// Thread-safe job status table, shared between the scheduler and its jobs.
///
/// ```
/// use corpus_scheduler::{JobOutput, JobRegistry, JobResult};
///
/// let registry = JobRegistry::new();
/// registry.register("index_requests", "0 * * * * *");
/// registry.record_start("index_requests");
/// assert!(registry.is_running("index_requests"));
///
/// let output = JobOutput::new().with_metadata("completed", 2);
/// registry.record_complete("index_requests", JobResult::Success, 850, output);
/// let status = registry.get_status("index_requests").unwrap();
/// assert_eq!(status.run_count, 1);
/// assert_eq!(status.last_run_metadata["completed"], "2");
/// ```
#[derive(Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<String, JobStatus>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, JobStatus>> {
        self.jobs.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, JobStatus>> {
        self.jobs.write().unwrap_or_else(|e| e.into_inner())
    }

    fn update(&self, job_name: &str, f: impl FnOnce(&mut JobStatus)) {
        if let Some(status) = self.write().get_mut(job_name) {
            f(status);
        }
    }

    /// Add a job, replacing any previous status under the same name.
    pub fn register(&self, job_name: &str, cron_expr: &str) {
        self.write()
            .insert(job_name.to_string(), JobStatus::new(job_name, cron_expr));
    }

    pub fn record_start(&self, job_name: &str) {
        self.update(job_name, |status| status.is_running = true);
    }

    /// Record a finished tick. Skips count separately from runs.
    pub fn record_complete(
        &self,
        job_name: &str,
        result: JobResult,
        duration_ms: u64,
        output: JobOutput,
    ) {
        self.update(job_name, |status| {
            status.is_running = false;
            status.last_run = Some(Utc::now());
            status.last_duration_ms = Some(duration_ms);
            match result {
                JobResult::Skipped(_) => status.skip_count += 1,
                JobResult::Failed(_) => {
                    status.run_count += 1;
                    status.error_count += 1;
                }
                JobResult::Success => status.run_count += 1,
            }
            status.last_result = Some(result);
            status.last_run_metadata = output.metadata;
        });
    }

    pub fn set_next_run(&self, job_name: &str, next: DateTime<Utc>) {
        self.update(job_name, |status| status.next_run = Some(next));
    }

    pub fn set_paused(&self, job_name: &str, paused: bool) {
        self.update(job_name, |status| status.is_paused = paused);
    }

    pub fn get_status(&self, job_name: &str) -> Option<JobStatus> {
        self.read().get(job_name).cloned()
    }

    /// All statuses, ordered by job name.
    pub fn get_all_status(&self) -> Vec<JobStatus> {
        let mut all: Vec<JobStatus> = self.read().values().cloned().collect();
        all.sort_by(|a, b| a.job_name.cmp(&b.job_name));
        all
    }

    pub fn is_registered(&self, job_name: &str) -> bool {
        self.read().contains_key(job_name)
    }

    pub fn is_running(&self, job_name: &str) -> bool {
        self.read().get(job_name).is_some_and(|s| s.is_running)
    }

    pub fn is_paused(&self, job_name: &str) -> bool {
        self.read().get(job_name).is_some_and(|s| s.is_paused)
    }

    pub fn job_count(&self) -> usize {
        self.read().len()
    }
}
