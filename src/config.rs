//! # Registration configuration.
//!
//! Provides [`RegistrationConfig`], centralized settings for
//! [`AutoRegistration`](crate::AutoRegistration).
//!
//! ## Sentinel values
//! - `bus_capacity = 0` → clamped to 1 by the bus

use crate::policies::BackoffPolicy;

/// Settings for token delivery.
///
/// ## Field semantics
/// - `backoff`: Delay policy between delivery rounds (default 500ms × 2, capped at 2 minutes)
/// - `bus_capacity`: Event bus ring buffer size (min 1)
#[derive(Clone, Debug)]
pub struct RegistrationConfig {
    /// Delay policy between delivery rounds.
    pub backoff: BackoffPolicy,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// The listener that feeds subscribers skips the oldest events if it
    /// falls more than `bus_capacity` events behind.
    pub bus_capacity: usize,
}

impl RegistrationConfig {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for RegistrationConfig {
    /// Default configuration:
    ///
    /// - `backoff = BackoffPolicy::default()` (500ms, ×2, max 120s, no jitter)
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            backoff: BackoffPolicy::default(),
            bus_capacity: 1024,
        }
    }
}
