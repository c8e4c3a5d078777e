//! Bounded retry with exponential backoff for HID writes.
//!
//! Writes to an idle robot occasionally need more than one attempt. Rather
//! than spinning until the device accepts the report, each connection makes
//! at most [`RetryConfig::max_attempts`] attempts, sleeping an increasing
//! delay between them, and then gives up with a connection error.

use std::time::Duration;

/// Configuration for write retries.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total attempts, including the first one. Never less than 1.
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Multiplier applied to the delay after each failure (typically 2.0).
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(2),
            max_delay: Duration::from_millis(50),
            multiplier: 2.0,
        }
    }
}

/// Backoff state for one retried operation.
#[derive(Debug)]
pub struct Backoff {
    config: RetryConfig,
    current_delay: Duration,
    failures: u32,
}

impl Backoff {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            current_delay: config.initial_delay,
            config,
            failures: 0,
        }
    }

    /// Record a failed attempt.
    ///
    /// Returns the delay to wait before the next attempt, or `None` once the
    /// attempt budget is spent.
    pub fn record_failure(&mut self) -> Option<Duration> {
        self.failures += 1;
        if self.failures >= self.config.max_attempts.max(1) {
            return None;
        }
        let delay = self.current_delay;
        let next = self.current_delay.as_secs_f64() * self.config.multiplier;
        self.current_delay = Duration::from_secs_f64(next).min(self.config.max_delay);
        Some(delay)
    }

    /// Failed attempts so far.
    pub fn failures(&self) -> u32 {
        self.failures
    }
}

/// Run `attempt` until it returns `Some`, sleeping between failures.
///
/// Returns `None` when every attempt failed. `on_failure` sees the failure
/// number (1-based) before the backoff sleep.
pub fn retry<T>(
    config: &RetryConfig,
    mut attempt: impl FnMut() -> Option<T>,
    mut on_failure: impl FnMut(u32),
) -> Option<T> {
    let mut backoff = Backoff::new(config.clone());
    loop {
        if let Some(value) = attempt() {
            return Some(value);
        }
        let delay = backoff.record_failure();
        on_failure(backoff.failures());
        std::thread::sleep(delay?);
    }
}
