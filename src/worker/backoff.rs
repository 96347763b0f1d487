//! Per-item exponential backoff for requeued commands.
//!
//! Each failing item gets its own failure counter. The delay before its next
//! delivery grows exponentially with that counter and is capped:
//!
//! - Default: 100ms base, doubling per failure, 5s cap
//!   (100ms, 200ms, 400ms, 800ms, 1.6s, 3.2s, 5s, 5s, ...)
//!
//! Forgetting an item resets its counter.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

/// Configuration for exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffConfig {
    /// Delay after the first failure.
    pub base_delay: Duration,

    /// Maximum delay (cap for exponential growth).
    pub max_delay: Duration,

    /// Multiplier applied per failure (typically 2.0).
    pub multiplier: f64,
}

impl BackoffConfig {
    /// 100ms base, 5s cap, doubling.
    pub const DEFAULT: Self = Self {
        base_delay: Duration::from_millis(100),
        max_delay: Duration::from_secs(5),
        multiplier: 2.0,
    };

    pub fn new(base_delay: Duration, max_delay: Duration, multiplier: f64) -> Self {
        Self {
            base_delay,
            max_delay,
            multiplier,
        }
    }

    /// Computes the delay for an item that has already failed `failures` times.
    ///
    /// `base_delay * multiplier^failures`, capped at `max_delay`.
    pub fn delay_for(&self, failures: u32) -> Duration {
        // Past this exponent every sane configuration is already at the cap,
        // and clamping keeps the i32 conversion and f64 math finite.
        let exponent = failures.min(64) as i32;
        let delay_nanos = self.base_delay.as_nanos() as f64 * self.multiplier.powi(exponent);
        let capped_nanos = delay_nanos.min(self.max_delay.as_nanos() as f64);
        Duration::from_nanos(capped_nanos.round() as u64)
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Tracks failures per item and hands out the matching delays.
#[derive(Debug)]
pub struct ItemBackoff<T> {
    config: BackoffConfig,
    failures: HashMap<T, u32>,
}

impl<T: Eq + Hash + Clone> ItemBackoff<T> {
    pub fn new(config: BackoffConfig) -> Self {
        Self {
            config,
            failures: HashMap::new(),
        }
    }

    /// Returns the delay for the item's next attempt and records one more
    /// failure against it.
    pub fn when(&mut self, item: &T) -> Duration {
        let failures = self.failures.entry(item.clone()).or_insert(0);
        let delay = self.config.delay_for(*failures);
        *failures = failures.saturating_add(1);
        delay
    }

    /// Number of failures recorded for the item since it was last forgotten.
    pub fn num_requeues(&self, item: &T) -> u32 {
        self.failures.get(item).copied().unwrap_or(0)
    }

    /// Clears the item's failure history.
    pub fn forget(&mut self, item: &T) {
        self.failures.remove(item);
    }

    /// Number of items with a failure history.
    #[cfg(test)]
    pub fn tracked(&self) -> usize {
        self.failures.len()
    }
}
