//! Retry policy for repeated hostname lookups.
//!
//! Provider name servers sometimes answer NXDOMAIN or nothing at all for a
//! host that comes back a moment later, so every host gets a fixed number of
//! attempts spaced by a constant delay.

use std::time::Duration;

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total number of lookup attempts per host (default: 20)
    pub repetition: usize,
    /// Fixed delay between two attempts (default: 1s)
    pub time_between: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            repetition: 20,
            time_between: Duration::from_secs(1),
        }
    }
}

impl RetryConfig {
    pub fn new(repetition: usize, time_between: Duration) -> Self {
        Self {
            repetition,
            time_between,
        }
    }

    /// Create a config with a single attempt.
    pub fn no_retry() -> Self {
        Self {
            repetition: 1,
            time_between: Duration::ZERO,
        }
    }
}

/// Delay to wait before the given attempt (0-based).
///
/// The first attempt starts immediately; every later one waits `time_between`.
pub fn delay_before(attempt: usize, config: &RetryConfig) -> Duration {
    if attempt == 0 {
        Duration::ZERO
    } else {
        config.time_between
    }
}

/// Check if another attempt is allowed after `attempt` attempts were made.
pub fn should_retry(attempt: usize, config: &RetryConfig) -> bool {
    attempt < config.repetition
}
