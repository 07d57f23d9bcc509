// Minimum spacing between provider calls

use crate::agents::clock::Clock;
use crate::utils::lock_mutex_recover;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Session-wide throttle for provider invocations
///
/// Each call to `throttle` reserves the next free slot under the lock before
/// sleeping, so concurrent callers are spaced out as well.
#[derive(Debug, Default)]
pub struct RateLimiter {
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            last_call: Mutex::new(None),
        }
    }

    /// Wait until at least `interval_ms` has passed since the previous call
    ///
    /// An interval of 0 disables throttling. The first call never waits.
    /// Returns how long this call waited.
    pub async fn throttle(&self, interval_ms: u64, clock: &dyn Clock) -> Duration {
        if interval_ms == 0 {
            return Duration::ZERO;
        }

        let interval = Duration::from_millis(interval_ms);
        let wait = {
            let mut last_call = lock_mutex_recover(&self.last_call);
            let now = clock.now();
            let slot = match *last_call {
                Some(previous) if previous + interval > now => previous + interval,
                _ => now,
            };
            *last_call = Some(slot);
            slot.saturating_duration_since(now)
        };

        if !wait.is_zero() {
            log::debug!("[RateLimiter] Waiting {}ms before next provider call", wait.as_millis());
            clock.sleep(wait).await;
        }

        wait
    }
}
