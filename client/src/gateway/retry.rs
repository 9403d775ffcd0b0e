//! Backoff schedule for rate-limited requests

use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;

use crate::config::RetryConfig;

/// Only "too many requests" is retried; every other status is final
pub fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
}

/// Exponential delay sequence capped at `max_delay`
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
    max: Duration,
    factor: f64,
}

impl Backoff {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            next: config.initial_delay().min(config.max_delay()),
            max: config.max_delay(),
            factor: config.backoff_factor.max(1.0),
        }
    }

    /// Delay before the next attempt; a server `Retry-After` takes precedence
    pub fn next_delay(&mut self, headers: &HeaderMap) -> Duration {
        let scheduled = self.next;
        self.next = self.next.mul_f64(self.factor).min(self.max);

        retry_after(headers).unwrap_or(scheduled).min(self.max)
    }
}

/// `Retry-After` in delta-seconds form
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
