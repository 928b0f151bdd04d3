//! Scheduled processing of the reindex request queue.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use corpus_indexing::{IndexingError, IndexingService, ProcessSummary, TracingProgress};

use crate::{
    JitterConfig, JobOutput, OverlapPolicy, SchedulerError, SchedulerService, TimeoutConfig,
};

pub const REQUEST_JOB: &str = "index_requests";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestJobConfig {
    /// Cron expression (default: every minute)
    pub cron: String,

    pub timezone: String,

    /// Max jitter in seconds (default: 5)
    pub jitter_secs: u64,

    /// Processing time limit per tick (default: 60; 0 = unlimited)
    pub time_limit_secs: u64,

    /// Scheduler-side ceiling on a tick (default: 120; 0 = none)
    pub timeout_secs: u64,
}

impl Default for RequestJobConfig {
    fn default() -> Self {
        Self {
            cron: "0 * * * * *".to_string(),
            timezone: "UTC".to_string(),
            jitter_secs: 5,
            time_limit_secs: 60,
            timeout_secs: 120,
        }
    }
}

impl RequestJobConfig {
    pub fn with_cron(mut self, cron: impl Into<String>) -> Self {
        self.cron = cron.into();
        self
    }

    pub fn with_time_limit(mut self, secs: u64) -> Self {
        self.time_limit_secs = secs;
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn time_limit(&self) -> Option<Duration> {
        super::time_limit(self.time_limit_secs)
    }
}

/// Register `index_requests` with the scheduler.
pub async fn create_request_job(
    scheduler: &SchedulerService,
    service: Arc<IndexingService>,
    config: RequestJobConfig,
) -> Result<(), SchedulerError> {
    let time_limit = config.time_limit();

    scheduler
        .register_job(
            REQUEST_JOB,
            &config.cron,
            Some(&config.timezone),
            OverlapPolicy::Skip,
            JitterConfig::new(config.jitter_secs),
            TimeoutConfig::new(config.timeout_secs),
            move |_token| {
                let service = service.clone();
                async move { run_request_processing(service, time_limit).await }
            },
        )
        .await?;

    info!(cron = %config.cron, "Registered index request job");
    Ok(())
}

/// Drain the queue, highest priority first, until empty or out of time.
pub async fn run_request_processing(
    service: Arc<IndexingService>,
    time_limit: Option<Duration>,
) -> Result<JobOutput, SchedulerError> {
    let result = tokio::task::spawn_blocking(move || drain_queue(&service, time_limit)).await?;

    match result {
        Ok(None) => {
            debug!("No index requests queued");
            Ok(JobOutput::new().with_metadata("completed", 0))
        }
        Ok(Some(summary)) => {
            info!(
                completed = summary.completed,
                skipped_deleted = summary.skipped_deleted,
                interrupted = summary.interrupted,
                "Index request run finished"
            );
            Ok(JobOutput::new()
                .with_metadata("completed", summary.completed)
                .with_metadata("skipped_deleted", summary.skipped_deleted)
                .with_metadata("interrupted", summary.interrupted))
        }
        Err(IndexingError::AlreadyRunning(lease)) => {
            info!(lease = %lease, "Request lease held elsewhere, skipping run");
            Ok(JobOutput::new().with_metadata("lease_held", lease))
        }
        Err(e) => Err(e.into()),
    }
}

/// Blocking part of a tick. `None` when nothing was queued.
fn drain_queue(
    service: &IndexingService,
    time_limit: Option<Duration>,
) -> Result<Option<ProcessSummary>, IndexingError> {
    if service.queue().is_empty()? {
        return Ok(None);
    }
    service
        .process_requests(time_limit, &TracingProgress)
        .map(Some)
}
