//! Scheduler-wide settings.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::jobs::{FullIndexJobConfig, RequestJobConfig};
use crate::SchedulerError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// IANA timezone used by jobs that do not name their own.
    #[serde(default = "default_timezone")]
    pub default_timezone: String,

    /// How long shutdown waits for running jobs to notice cancellation.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    #[serde(default)]
    pub full_index: FullIndexJobConfig,

    #[serde(default)]
    pub requests: RequestJobConfig,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_shutdown_timeout() -> u64 {
    30
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            default_timezone: default_timezone(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            full_index: FullIndexJobConfig::default(),
            requests: RequestJobConfig::default(),
        }
    }
}

impl SchedulerConfig {
    pub fn parse_timezone(&self) -> Result<Tz, SchedulerError> {
        parse_timezone(&self.default_timezone)
    }
}

pub(crate) fn parse_timezone(name: &str) -> Result<Tz, SchedulerError> {
    name.parse::<Tz>()
        .map_err(|_| SchedulerError::InvalidTimezone(name.to_string()))
}
