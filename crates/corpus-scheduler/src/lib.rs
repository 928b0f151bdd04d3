//! # corpus-scheduler
//!
//! Runs the indexing core on a timetable.
//!
//! Built on `tokio-cron-scheduler` with timezone-aware cron expressions.
//! Every job registered through [`SchedulerService::register_job`] gets:
//!
//! - a skip-if-running [`OverlapPolicy`]
//! - an optional random start delay ([`JitterConfig`])
//! - an optional wall-clock ceiling ([`TimeoutConfig`])
//! - a status row in the [`JobRegistry`]
//!
//! The two recurring jobs live in [`jobs`]: `full_corpus_index` walks every
//! enabled area under a time limit, `index_requests` drains the request
//! queue.
//!
//! ```ignore
//! use corpus_scheduler::{jobs, SchedulerConfig, SchedulerService};
//!
//! let scheduler = SchedulerService::new(SchedulerConfig::default()).await?;
//! jobs::create_full_index_job(&scheduler, service.clone(), Default::default()).await?;
//! jobs::create_request_job(&scheduler, service, Default::default()).await?;
//! scheduler.start().await?;
//! ```

mod config;
mod error;
mod overlap;
mod policy;
mod registry;
mod scheduler;

pub mod jobs;

pub use config::SchedulerConfig;
pub use error::SchedulerError;
pub use overlap::{OverlapGuard, OverlapPolicy, RunGuard};
pub use policy::{JitterConfig, TimeoutConfig};
pub use registry::{JobOutput, JobRegistry, JobResult, JobStatus};
pub use scheduler::{validate_cron_expression, SchedulerService};
