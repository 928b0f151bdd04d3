//! Injectable wall clock.
//!
//! Time budgets and the indexing delay are evaluated against a [`Clock`] so
//! tests can drive time explicitly with [`ManualClock`].

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

use crate::Timestamp;

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;

    /// Whole seconds since the Unix epoch.
    fn now(&self) -> Timestamp {
        self.now_millis().div_euclid(1000)
    }

    /// Seconds elapsed since `start_millis`, with millisecond precision.
    fn elapsed_secs(&self, start_millis: i64) -> f64 {
        (self.now_millis() - start_millis) as f64 / 1000.0
    }
}

/// Real time from the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    /// Start at the given time in whole seconds.
    pub fn at(seconds: Timestamp) -> Self {
        Self {
            millis: AtomicI64::new(seconds * 1000),
        }
    }

    pub fn set(&self, seconds: Timestamp) {
        self.millis.store(seconds * 1000, Ordering::SeqCst);
    }

    pub fn advance_secs(&self, seconds: i64) {
        self.advance_millis(seconds * 1000);
    }

    pub fn advance_millis(&self, millis: i64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.millis.load(Ordering::SeqCst)
    }
}
