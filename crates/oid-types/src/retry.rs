//! Bounded retry with fixed backoff.
//!
//! Index visibility after a mint is eventually consistent; the faucet flow
//! polls a bounded number of times instead of blocking indefinitely.

use std::time::Duration;

/// Configuration for retry behavior on eventually-consistent reads.
#[derive(Debug, Copy, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first).
    pub attempts: usize,
    /// Fixed delay between attempts.
    pub delay: Duration,
}

impl RetryConfig {
    pub fn new(attempts: usize, delay_ms: u64) -> Self {
        Self {
            attempts,
            delay: Duration::from_millis(delay_ms),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 4,
            delay: Duration::from_millis(1500),
        }
    }
}

/// Run `f` up to `config.attempts` times, sleeping `config.delay` between
/// attempts, until it yields `Some`. Returns `None` when every attempt
/// comes back empty. Errors inside `f` are the caller's concern; `f`
/// signals "not yet" with `None`.
pub fn retry_until<T>(config: RetryConfig, mut f: impl FnMut() -> Option<T>) -> Option<T> {
    for attempt in 0..config.attempts {
        if let Some(value) = f() {
            return Some(value);
        }
        if attempt + 1 < config.attempts {
            std::thread::sleep(config.delay);
        }
    }
    None
}
