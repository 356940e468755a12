//! Reconnect backoff
//!
//! `delay = min(base * 2^attempt, max)` with ±10% jitter, never above `max`.

use rand::Rng;
use std::time::Duration;

const JITTER_FACTOR: f64 = 0.1;

/// Capped exponential backoff with jitter
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    attempt: u32,
}

impl Backoff {
    #[must_use]
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max: max.max(base),
            attempt: 0,
        }
    }

    /// Delay before the next attempt; each call doubles the following one
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.delay_for(self.attempt);
        self.attempt = self.attempt.saturating_add(1);

        let millis = delay.as_millis() as u64;
        let jitter_range = (millis as f64 * JITTER_FACTOR) as i64;
        let jitter = if jitter_range > 0 {
            rand::thread_rng().gen_range(-jitter_range..=jitter_range)
        } else {
            0
        };

        let jittered = millis.saturating_add_signed(jitter);
        Duration::from_millis(jittered).min(self.max)
    }

    /// Un-jittered delay for a given attempt
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(self.max)
    }

    /// Back to the base delay after a successful connection
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Attempts since the last reset
    pub fn attempts(&self) -> u32 {
        self.attempt
    }
}
