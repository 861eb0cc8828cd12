//! Exponential backoff for broker reconnection.
//!
//! The delay grows exponentially and is capped:
//! ```text
//! delay[n] = min(initial * multiplier^(n-1), max_delay)
//! ```
//!
//! With the defaults (initial=1s, multiplier=2.0, max=60s):
//! - Attempt 1: wait 1s
//! - Attempt 2: wait 2s
//! - Attempt 3: wait 4s
//! - ...
//! - Attempt 7+: wait 60s (capped)
//!
//! Unlike a bounded retry policy the sensor daemon never gives up on the
//! broker: readings keep being sampled and exported through metrics while the
//! connection is down.

use std::time::Duration;

/// Exponential backoff controller for connection retry logic.
#[derive(Debug, Clone)]
pub struct Backoff {
    /// The initial delay before the first retry.
    initial_delay: Duration,

    /// The delay returned by the next call to [`Backoff::next_sleep`].
    current_delay: Duration,

    /// Maximum delay cap.
    max_delay: Duration,

    /// Multiplicative factor applied after each attempt.
    multiplier: f64,

    /// Count of attempted retries (0 before first attempt).
    attempt: u32,
}

impl Backoff {
    /// Creates a new backoff controller with custom timing parameters.
    ///
    /// A `multiplier` below 1.0 is clamped to 1.0 (constant delay).
    pub fn new(initial: Duration, max: Duration, multiplier: f64) -> Self {
        Self {
            initial_delay: initial,
            current_delay: initial.min(max),
            max_delay: max,
            multiplier: multiplier.max(1.0),
            attempt: 0,
        }
    }

    /// Resets the backoff to its initial state.
    ///
    /// Call this once the broker acknowledged a connection.
    pub fn reset(&mut self) {
        self.current_delay = self.initial_delay.min(self.max_delay);
        self.attempt = 0;
    }

    /// Returns the delay to wait before the next attempt and advances the schedule.
    pub fn next_sleep(&mut self) -> Duration {
        let delay = self.current_delay;
        self.attempt = self.attempt.saturating_add(1);

        let next = self.current_delay.as_secs_f64() * self.multiplier;
        self.current_delay = Duration::from_secs_f64(next.min(self.max_delay.as_secs_f64()));

        delay
    }

    /// Number of attempts since the last reset.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(60), 2.0)
    }
}
