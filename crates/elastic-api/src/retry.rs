//! Retry limit and exponential backoff for transport failures.

use std::time::Duration;

/// Attempt budget and backoff base for one logical call.
///
/// Attempts are numbered from 1. After attempt `k` fails, the client waits
/// `base_delay * 2^(k-1)` before attempt `k + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of physical attempts, including the first.
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Attempt budget, never below one.
    pub const fn attempts(&self) -> u32 {
        if self.max_attempts == 0 {
            1
        } else {
            self.max_attempts
        }
    }

    /// Whether another attempt may follow failed attempt number `attempt`.
    pub const fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.attempts()
    }

    /// Backoff to sleep after failed attempt number `attempt`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let factor = 1_u32.checked_shl(exponent).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}
