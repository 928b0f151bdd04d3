//! Scheduler service over tokio-cron-scheduler.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono_tz::Tz;
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::parse_timezone;
use crate::overlap::{OverlapGuard, OverlapPolicy};
use crate::policy::{JitterConfig, TimeoutConfig};
use crate::registry::{JobOutput, JobRegistry, JobResult};
use crate::{SchedulerConfig, SchedulerError};

/// Check a 6-field cron expression (sec min hour day month weekday).
///
/// ```
/// use corpus_scheduler::validate_cron_expression;
///
/// assert!(validate_cron_expression("0 */10 * * * *").is_ok());
/// assert!(validate_cron_expression("every ten minutes").is_err());
/// ```
pub fn validate_cron_expression(expr: &str) -> Result<(), SchedulerError> {
    Job::new_async(expr, |_uuid, _lock| Box::pin(async {}))
        .map(|_| ())
        .map_err(|e| SchedulerError::InvalidCron(format!("'{}': {}", expr, e)))
}

/// Owns the cron scheduler, the job registry and the shutdown token.
pub struct SchedulerService {
    scheduler: JobScheduler,
    config: SchedulerConfig,
    registry: Arc<JobRegistry>,
    shutdown_token: CancellationToken,
    is_running: AtomicBool,
}

impl SchedulerService {
    /// Create a stopped scheduler. Fails on an unknown default timezone.
    pub async fn new(config: SchedulerConfig) -> Result<Self, SchedulerError> {
        config.parse_timezone()?;
        let scheduler = JobScheduler::new().await?;

        Ok(Self {
            scheduler,
            config,
            registry: Arc::new(JobRegistry::new()),
            shutdown_token: CancellationToken::new(),
            is_running: AtomicBool::new(false),
        })
    }

    pub async fn start(&self) -> Result<(), SchedulerError> {
        if self.is_running.swap(true, Ordering::SeqCst) {
            return Err(SchedulerError::AlreadyRunning);
        }
        self.scheduler.start().await?;
        info!(jobs = self.registry.job_count(), "Scheduler started");
        Ok(())
    }

    /// Cancel the shutdown token, give running jobs a grace period, then
    /// stop the cron loop.
    pub async fn shutdown(&mut self) -> Result<(), SchedulerError> {
        if !self.is_running.load(Ordering::SeqCst) {
            return Err(SchedulerError::NotRunning);
        }

        info!("Initiating scheduler shutdown");
        self.shutdown_token.cancel();

        let deadline = Instant::now() + Duration::from_secs(self.config.shutdown_timeout_secs);
        while self.any_job_running() && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        if self.any_job_running() {
            warn!("Jobs still running at shutdown timeout");
        }

        if let Err(e) = self.scheduler.shutdown().await {
            warn!(error = %e, "Error during scheduler shutdown");
        }
        self.is_running.store(false, Ordering::SeqCst);
        info!("Scheduler shutdown complete");
        Ok(())
    }

    fn any_job_running(&self) -> bool {
        self.registry.get_all_status().iter().any(|s| s.is_running)
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    pub fn registry(&self) -> Arc<JobRegistry> {
        self.registry.clone()
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    fn resolve_timezone(&self, timezone: Option<&str>) -> Result<Tz, SchedulerError> {
        match timezone {
            Some(name) => parse_timezone(name),
            None => self.config.parse_timezone(),
        }
    }

    /// Register a recurring job.
    ///
    /// On each tick the job is skipped if paused, or if `overlap` is
    /// [`OverlapPolicy::Skip`] and the previous run is still active.
    /// Otherwise it sleeps for the jitter, runs `job_fn` under `timeout`
    /// and records the outcome in the registry. `job_fn` receives the
    /// shutdown token.
    #[allow(clippy::too_many_arguments)]
    pub async fn register_job<F, Fut>(
        &self,
        name: &str,
        cron_expr: &str,
        timezone: Option<&str>,
        overlap: OverlapPolicy,
        jitter: JitterConfig,
        timeout: TimeoutConfig,
        job_fn: F,
    ) -> Result<Uuid, SchedulerError>
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<JobOutput, SchedulerError>> + Send + 'static,
    {
        let tz = self.resolve_timezone(timezone)?;
        validate_cron_expression(cron_expr)?;

        let job_name = name.to_string();
        let registry = self.registry.clone();
        let guard = Arc::new(OverlapGuard::new(overlap));
        let token = self.shutdown_token.clone();
        let job_fn = Arc::new(job_fn);

        let job = Job::new_async_tz(cron_expr, tz, move |uuid, mut lock| {
            let name = job_name.clone();
            let registry = registry.clone();
            let guard = guard.clone();
            let token = token.clone();
            let job_fn = job_fn.clone();

            Box::pin(async move {
                run_tick(&name, &registry, &guard, jitter, timeout, token, job_fn.as_ref())
                    .await;
                if let Ok(Some(next)) = lock.next_tick_for_job(uuid).await {
                    registry.set_next_run(&name, next);
                }
            })
        })
        .map_err(|e| SchedulerError::InvalidCron(e.to_string()))?;

        self.registry.register(name, cron_expr);
        let uuid = self.scheduler.add(job).await?;
        info!(job = %name, uuid = %uuid, cron = %cron_expr, timezone = %tz.name(), "Job registered");
        Ok(uuid)
    }

    /// Paused jobs keep their schedule but skip every tick.
    pub fn pause_job(&self, name: &str) -> Result<(), SchedulerError> {
        self.set_paused(name, true)
    }

    pub fn resume_job(&self, name: &str) -> Result<(), SchedulerError> {
        self.set_paused(name, false)
    }

    fn set_paused(&self, name: &str, paused: bool) -> Result<(), SchedulerError> {
        if !self.registry.is_registered(name) {
            return Err(SchedulerError::JobNotFound(name.to_string()));
        }
        self.registry.set_paused(name, paused);
        info!(job = %name, paused, "Job pause state changed");
        Ok(())
    }
}

/// One scheduled tick of a job, recorded in the registry.
pub(crate) async fn run_tick<F, Fut>(
    name: &str,
    registry: &JobRegistry,
    guard: &OverlapGuard,
    jitter: JitterConfig,
    timeout: TimeoutConfig,
    token: CancellationToken,
    job_fn: &F,
) where
    F: Fn(CancellationToken) -> Fut,
    Fut: Future<Output = Result<JobOutput, SchedulerError>>,
{
    if token.is_cancelled() {
        return;
    }
    if registry.is_paused(name) {
        debug!(job = %name, "Job paused, skipping");
        registry.record_complete(
            name,
            JobResult::Skipped("paused".to_string()),
            0,
            JobOutput::new(),
        );
        return;
    }
    let Some(_run) = guard.try_acquire() else {
        info!(job = %name, "Previous run still active, skipping");
        registry.record_complete(
            name,
            JobResult::Skipped("previous run still active".to_string()),
            0,
            JobOutput::new(),
        );
        return;
    };

    jitter.delay().await;

    registry.record_start(name);
    let start = Instant::now();
    let (result, output) = match timeout.run(job_fn(token)).await {
        Some(Ok(output)) => (JobResult::Success, output),
        Some(Err(e)) => {
            warn!(job = %name, error = %e, "Job failed");
            (JobResult::Failed(e.to_string()), JobOutput::new())
        }
        None => {
            warn!(job = %name, timeout_secs = timeout.timeout_secs, "Job timed out");
            (
                JobResult::Failed(format!("timed out after {}s", timeout.timeout_secs)),
                JobOutput::new(),
            )
        }
    };
    let duration_ms = start.elapsed().as_millis() as u64;
    info!(job = %name, duration_ms, result = ?result, "Job completed");
    registry.record_complete(name, result, duration_ms, output);
}
