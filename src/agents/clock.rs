// Time source used for throttling and retry backoff

use crate::utils::lock_mutex_recover;
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Time source for the pipeline
///
/// Production code sleeps on the tokio timer; tests swap in `ManualClock` to
/// observe waits without spending wall time.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    async fn sleep(&self, duration: Duration);
}

/// Wall clock backed by `tokio::time`
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Virtual clock that advances only when slept on
///
/// Every requested sleep is recorded so callers can assert on backoff schedules.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    /// Move time forward without recording a sleep
    pub fn advance(&self, duration: Duration) {
        *lock_mutex_recover(&self.offset) += duration;
    }

    /// All sleeps requested so far, in order
    pub fn sleeps(&self) -> Vec<Duration> {
        lock_mutex_recover(&self.sleeps).clone()
    }

    /// Sum of all requested sleeps
    pub fn total_slept(&self) -> Duration {
        lock_mutex_recover(&self.sleeps).iter().sum()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *lock_mutex_recover(&self.offset)
    }

    async fn sleep(&self, duration: Duration) {
        lock_mutex_recover(&self.sleeps).push(duration);
        self.advance(duration);
    }
}
