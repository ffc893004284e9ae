//! # Jitter applied to backoff sleeps.
//!
//! Many devices rotate their push tokens at the same moment (an OS update, a
//! provider outage ending). [`JitterPolicy`] spreads their retries so they do
//! not hit the registration endpoint in lockstep.
//!
//! - [`JitterPolicy::None`] sleep exactly the backoff delay
//! - [`JitterPolicy::Full`] sleep in `[0, delay]`
//! - [`JitterPolicy::Equal`] sleep in `[delay/2, delay]`
//! - [`JitterPolicy::Decorrelated`] sleep in `[base, min(3 × delay, max)]`

use std::time::Duration;

use rand::Rng;

/// Randomization of retry sleeps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JitterPolicy {
    /// Sleep the exact backoff delay.
    #[default]
    None,
    /// Sleep a uniformly random duration in `[0, delay]`.
    Full,
    /// Sleep `delay/2` plus a uniformly random duration in `[0, delay/2]`.
    Equal,
    /// Sleep a uniformly random duration in `[base, min(3 × delay, max)]`.
    ///
    /// Needs the policy bounds; see [`apply_decorrelated`](Self::apply_decorrelated).
    Decorrelated,
}

impl JitterPolicy {
    /// Applies jitter to `delay`.
    ///
    /// `Decorrelated` returns `delay` unchanged here.
    pub fn apply(&self, delay: Duration) -> Duration {
        let ms = delay.as_millis() as u64;
        match self {
            JitterPolicy::None | JitterPolicy::Decorrelated => delay,
            JitterPolicy::Full => Duration::from_millis(random_between(0, ms)),
            JitterPolicy::Equal => {
                let half = ms / 2;
                Duration::from_millis(half + random_between(0, ms - half))
            }
        }
    }

    /// Applies decorrelated jitter given the policy floor (`base`) and cap (`max`).
    ///
    /// Falls back to [`apply`](Self::apply) for other variants.
    pub fn apply_decorrelated(&self, base: Duration, delay: Duration, max: Duration) -> Duration {
        if !matches!(self, JitterPolicy::Decorrelated) {
            return self.apply(delay);
        }

        let base_ms = base.as_millis() as u64;
        let upper_ms = (delay.as_millis() as u64)
            .saturating_mul(3)
            .min(max.as_millis() as u64)
            .max(base_ms);

        if base_ms >= upper_ms {
            return base;
        }
        Duration::from_millis(random_between(base_ms, upper_ms))
    }
}

fn random_between(low: u64, high: u64) -> u64 {
    if low >= high {
        return low;
    }
    rand::rng().random_range(low..=high)
}
