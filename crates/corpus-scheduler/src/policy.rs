//! Start delay and wall-clock ceiling applied around each job run.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Random delay before a run starts, uniformly in `[0, max_jitter_secs)`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct JitterConfig {
    /// 0 disables jitter
    pub max_jitter_secs: u64,
}

impl JitterConfig {
    pub fn new(max_jitter_secs: u64) -> Self {
        Self { max_jitter_secs }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.max_jitter_secs > 0
    }

    pub fn generate_jitter(&self) -> Duration {
        if !self.is_enabled() {
            return Duration::ZERO;
        }
        let millis = rand::rng().random_range(0..self.max_jitter_secs * 1000);
        Duration::from_millis(millis)
    }

    /// Sleep for a fresh jitter delay.
    pub async fn delay(&self) {
        let jitter = self.generate_jitter();
        if !jitter.is_zero() {
            tracing::debug!(jitter_ms = jitter.as_millis() as u64, "Applying jitter delay");
            tokio::time::sleep(jitter).await;
        }
    }
}

/// Upper bound on how long the scheduler waits for a run.
///
/// The indexing jobs already stop themselves at their time limit, so the
/// timeout is a backstop set somewhat above it. A run on a blocking thread
/// keeps going after the timeout fires; only the wait is abandoned.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// 0 disables the timeout
    pub timeout_secs: u64,
}

impl TimeoutConfig {
    pub fn new(timeout_secs: u64) -> Self {
        Self { timeout_secs }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn duration(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Await `fut`, giving up after the configured duration.
    ///
    /// Returns `None` when the timeout fired.
    pub async fn run<F: Future>(&self, fut: F) -> Option<F::Output> {
        match self.duration() {
            Some(limit) => tokio::time::timeout(limit, fut).await.ok(),
            None => Some(fut.await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jitter_disabled() {
        let config = JitterConfig::none();
        assert!(!config.is_enabled());
        assert_eq!(config.generate_jitter(), Duration::ZERO);
        assert_eq!(JitterConfig::default(), config);
    }

    #[test]
    fn test_jitter_within_bounds() {
        let config = JitterConfig::new(3);
        let samples: Vec<Duration> = (0..500).map(|_| config.generate_jitter()).collect();
        assert!(samples.iter().all(|d| *d < Duration::from_secs(3)));

        let distinct: std::collections::HashSet<_> =
            samples.iter().map(|d| d.as_millis()).collect();
        assert!(distinct.len() > 1);
    }

    #[test]
    fn test_timeout_duration() {
        assert_eq!(TimeoutConfig::none().duration(), None);
        assert_eq!(
            TimeoutConfig::new(90).duration(),
            Some(Duration::from_secs(90))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fires() {
        let config = TimeoutConfig::new(1);
        let result = config
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "finished"
            })
            .await;
        assert_eq!(result, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_passes_output_through() {
        let result = TimeoutConfig::new(10).run(async { 7 }).await;
        assert_eq!(result, Some(7));

        let result = TimeoutConfig::none()
            .run(async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                "slow"
            })
            .await;
        assert_eq!(result, Some("slow"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_jitter_delay_is_bounded() {
        let start = tokio::time::Instant::now();
        JitterConfig::new(2).delay().await;
        assert!(start.elapsed() < Duration::from_secs(2));
    }
}
