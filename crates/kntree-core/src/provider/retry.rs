// ── Readiness polling policy ──

use std::time::Duration;

/// Exponential backoff for the wait-for-readiness loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay before the second attempt. Default: 250ms.
    pub initial_backoff: Duration,
    /// Upper bound on the delay between attempts. Default: 5s.
    pub max_backoff: Duration,
    /// Attempts before giving up with `NotReady`. `None` polls until
    /// cancelled. Default: 40.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(5),
            max_attempts: Some(40),
        }
    }
}

impl RetryPolicy {
    /// A policy that polls until cancelled.
    pub fn unbounded() -> Self {
        Self {
            max_attempts: None,
            ..Self::default()
        }
    }

    /// Delay after the given (zero-based) failed attempt.
    ///
    /// `delay = min(initial * 2^attempt, max)`
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1_u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.initial_backoff
            .checked_mul(factor)
            .map_or(self.max_backoff, |d| d.min(self.max_backoff))
    }

    /// Whether another attempt is allowed after `attempts` have run.
    pub fn allows(&self, attempts: u32) -> bool {
        self.max_attempts.is_none_or(|max| attempts < max)
    }
}
