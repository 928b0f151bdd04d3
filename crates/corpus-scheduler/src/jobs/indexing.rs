//! Scheduled full-corpus indexing.
//!
//! Each tick indexes every enabled area from its cursor until the time
//! limit. Areas left partial, and slow ones, go last on the next tick, so
//! a corpus that cannot be indexed in one tick catches up over several.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use corpus_indexing::{IndexingError, IndexingService, TracingProgress};

use crate::{
    JitterConfig, JobOutput, OverlapPolicy, SchedulerError, SchedulerService, TimeoutConfig,
};

pub const FULL_INDEX_JOB: &str = "full_corpus_index";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FullIndexJobConfig {
    /// Cron expression (default: every 10 minutes)
    pub cron: String,

    pub timezone: String,

    /// Max jitter in seconds (default: 30)
    pub jitter_secs: u64,

    /// Indexing time limit per tick (default: 600; 0 = unlimited)
    pub time_limit_secs: u64,

    /// Scheduler-side ceiling on a tick (default: 900; 0 = none)
    pub timeout_secs: u64,
}

impl Default for FullIndexJobConfig {
    fn default() -> Self {
        Self {
            cron: "0 */10 * * * *".to_string(),
            timezone: "UTC".to_string(),
            jitter_secs: 30,
            time_limit_secs: 600,
            timeout_secs: 900,
        }
    }
}

impl FullIndexJobConfig {
    pub fn with_cron(mut self, cron: impl Into<String>) -> Self {
        self.cron = cron.into();
        self
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    pub fn with_jitter(mut self, jitter_secs: u64) -> Self {
        self.jitter_secs = jitter_secs;
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

/// Register `full_corpus_index` with the scheduler.
///
/// # Errors
///
/// Invalid cron expression or timezone.
pub async fn create_full_index_job(
    scheduler: &SchedulerService,
    service: Arc<IndexingService>,
    config: FullIndexJobConfig,
) -> Result<(), SchedulerError> {
    let time_limit = config.time_limit();

    scheduler
        .register_job(
            FULL_INDEX_JOB,
            &config.cron,
            Some(&config.timezone),
            OverlapPolicy::Skip,
            JitterConfig::new(config.jitter_secs),
            TimeoutConfig::new(config.timeout_secs),
            move |_token| {
                let service = service.clone();
                async move { run_full_index(service, time_limit).await }
            },
        )
        .await?;

    info!(cron = %config.cron, time_limit_secs = config.time_limit_secs, "Registered full corpus index job");
    Ok(())
}

/// One incremental pass over the corpus.
pub async fn run_full_index(
    service: Arc<IndexingService>,
    time_limit: Option<Duration>,
) -> Result<JobOutput, SchedulerError> {
    debug!(?time_limit, "Starting full corpus index run");

    let result =
        tokio::task::spawn_blocking(move || service.index(false, time_limit, &TracingProgress))
            .await?;

    match result {
        Ok(summary) => {
            info!(
                areas = summary.areas.len(),
                records = summary.records(),
                documents = summary.documents(),
                partial = summary.partial(),
                "Full corpus index run finished"
            );
            Ok(JobOutput::new()
                .with_metadata("areas", summary.areas.len())
                .with_metadata("records", summary.records())
                .with_metadata("documents", summary.documents())
                .with_metadata("partial", summary.partial()))
        }
        Err(IndexingError::AlreadyRunning(lease)) => {
            info!(lease = %lease, "Index lease held elsewhere, skipping run");
            Ok(JobOutput::new().with_metadata("lease_held", lease))
        }
        Err(e) => Err(e.into()),
    }
}
