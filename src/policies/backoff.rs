//! # Backoff policy for delivery retries.
//!
//! [`BackoffPolicy`] controls how retry delays grow after repeated failures.
//! It is parameterized by:
//! - [`BackoffPolicy::first`] the initial delay;
//! - [`BackoffPolicy::factor`] the multiplicative growth factor;
//! - [`BackoffPolicy::max`] the maximum delay cap.
//!
//! Delays grow one step per retry-requested round: `next = min(max, prev × factor)`.
//! The sequence starts at `first` and is never clamped before the first step,
//! so the slept delays are `first, min(max, first × factor), ...`.
//!
//! Jitter is applied to the slept duration only ([`BackoffPolicy::sleep_for`]);
//! the jittered value never feeds back into [`BackoffPolicy::grow`].
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use tokenvisor::{BackoffPolicy, JitterPolicy};
//!
//! let backoff = BackoffPolicy {
//!     first: Duration::from_millis(100),
//!     max: Duration::from_secs(1),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//! };
//!
//! assert_eq!(backoff.grow(Duration::from_millis(100)), Duration::from_millis(200));
//! assert_eq!(backoff.grow(Duration::from_millis(800)), Duration::from_secs(1));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Retry backoff policy.
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    /// Delay slept before the second round.
    pub first: Duration,
    /// Maximum delay cap for retries.
    pub max: Duration,
    /// Multiplicative growth factor (`>= 1.0` recommended).
    pub factor: f64,
    /// Jitter applied to each sleep.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// Returns a policy with:
    /// - `first = 500ms`;
    /// - `factor = 2.0`;
    /// - `max = 120s`;
    /// - no jitter.
    fn default() -> Self {
        Self {
            first: Duration::from_millis(500),
            max: Duration::from_secs(120),
            factor: 2.0,
            jitter: JitterPolicy::None,
        }
    }
}

impl BackoffPolicy {
    /// Computes the delay following `prev`: `min(max, prev × factor)`.
    ///
    /// # Notes
    /// - Non-finite or negative products clamp to [`BackoffPolicy::max`].
    /// - If `factor` equals 1.0, the delay stays at `prev` (up to `max`).
    pub fn grow(&self, prev: Duration) -> Duration {
        let max_secs = self.max.as_secs_f64();
        let next_secs = prev.as_secs_f64() * self.factor;

        if !next_secs.is_finite() || next_secs < 0.0 || next_secs > max_secs {
            self.max
        } else {
            Duration::from_secs_f64(next_secs)
        }
    }

    /// Returns the duration to actually sleep for a round whose base delay is `delay`.
    ///
    /// With [`JitterPolicy::None`] this is exactly `delay`.
    pub fn sleep_for(&self, delay: Duration) -> Duration {
        match self.jitter {
            JitterPolicy::Decorrelated => {
                self.jitter
                    .apply_decorrelated(self.first.min(self.max), delay, self.max)
            }
            _ => self.jitter.apply(delay),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn policy(first_ms: u64, max_ms: u64, factor: f64) -> BackoffPolicy {
        BackoffPolicy {
            first: Duration::from_millis(first_ms),
            max: Duration::from_millis(max_ms),
            factor,
            jitter: JitterPolicy::None,
        }
    }

    #[test]
    fn test_defaults() {
        let p = BackoffPolicy::default();
        assert_eq!(p.first, Duration::from_millis(500));
        assert_eq!(p.max, Duration::from_millis(120_000));
        assert_eq!(p.factor, 2.0);
        assert_eq!(p.jitter, JitterPolicy::None);
    }

    #[test]
    fn test_exponential_growth_no_jitter() {
        let p = policy(100, 30_000, 2.0);
        let mut delay = p.first;
        let mut seen = vec![delay];
        for _ in 0..4 {
            delay = p.grow(delay);
            seen.push(delay);
        }
        let expected: Vec<Duration> = [100, 200, 400, 800, 1600]
            .into_iter()
            .map(Duration::from_millis)
            .collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_constant_factor() {
        let p = policy(500, 30_000, 1.0);
        let mut delay = p.first;
        for _ in 0..10 {
            delay = p.grow(delay);
            assert_eq!(delay, Duration::from_millis(500));
        }
    }

    #[test]
    fn test_clamped_to_max() {
        let p = policy(100, 1_000, 2.0);
        let mut delay = p.first;
        for _ in 0..10 {
            delay = p.grow(delay);
        }
        assert_eq!(delay, Duration::from_secs(1));
    }

    #[test]
    fn test_first_is_not_clamped_before_growth() {
        let p = policy(10_000, 5_000, 2.0);
        assert_eq!(p.sleep_for(p.first), Duration::from_secs(10));
        assert_eq!(p.grow(p.first), Duration::from_secs(5));
    }

    #[test]
    fn test_non_finite_overflow_clamps_to_max() {
        let p = policy(100, 10_000, f64::INFINITY);
        assert_eq!(p.grow(Duration::from_millis(100)), Duration::from_secs(10));
    }

    #[test]
    fn test_jitter_does_not_feed_back() {
        let p = BackoffPolicy {
            jitter: JitterPolicy::Full,
            ..policy(100, 30_000, 2.0)
        };
        let mut delay = p.first;
        for _ in 0..5 {
            assert!(p.sleep_for(delay) <= delay);
            delay = p.grow(delay);
        }
        assert_eq!(delay, Duration::from_millis(3_200));
    }

    #[test]
    fn test_equal_jitter_bounds() {
        let p = BackoffPolicy {
            jitter: JitterPolicy::Equal,
            ..policy(1_000, 30_000, 1.0)
        };
        for _ in 0..50 {
            let slept = p.sleep_for(p.first);
            assert!(slept >= Duration::from_millis(500));
            assert!(slept <= Duration::from_millis(1_000));
        }
    }
}
