//! Backoff utilities for the polling loop.

use std::time::Duration;

/// Default base delay when poll backoff is enabled.
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(10);

/// Default cap for poll backoff.
pub const DEFAULT_BACKOFF_MAX: Duration = Duration::from_secs(120);

/// Exponential backoff settings applied after a failed poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub base: Duration,
    pub max: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base: DEFAULT_BACKOFF_BASE,
            max: DEFAULT_BACKOFF_MAX,
        }
    }
}

impl Backoff {
    /// Delay before the next poll after `failures` consecutive failures (1-based).
    pub fn delay_after(&self, failures: u32) -> Duration {
        calculate_backoff(failures.saturating_sub(1), self.base, self.max)
    }
}

/// Determine if a reqwest error is a transient network error.
///
/// Connection errors, timeouts, body transfer failures and 502/503/504
/// responses are transient.
pub fn is_transient_network_error(error: &reqwest::Error) -> bool {
    if error.is_connect() || error.is_timeout() || error.is_body() {
        return true;
    }

    if let Some(status) = error.status() {
        return matches!(status.as_u16(), 502 | 503 | 504);
    }

    false
}

/// Calculate an exponential backoff delay.
///
/// Uses min(base * 2^attempt + offset, max), where the offset is a fixed half
/// of the base, capped at 500ms. The result is deterministic.
pub fn calculate_backoff(attempt: u32, base: Duration, max: Duration) -> Duration {
    let exponential = base.saturating_mul(2u32.saturating_pow(attempt));
    let offset_ms = (base.as_millis() as u64).min(1000) / 2;
    exponential
        .saturating_add(Duration::from_millis(offset_ms))
        .min(max)
}
