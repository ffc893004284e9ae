//! Retry delay policies.
//!
//! This module groups the knobs that control **how long** to wait between
//! delivery rounds.
//!
//! ## Contents
//! - [`BackoffPolicy`] how retry delays evolve (first / factor / max + jitter)
//! - [`JitterPolicy`]  randomization applied to the slept duration
//!
//! ## Quick wiring
//! ```text
//! RegistrationConfig { backoff: BackoffPolicy, .. }
//!      └─► retry::Retries uses:
//!           - backoff.first as the delay before the second round
//!           - backoff.grow(delay) after every retry-requested round
//!           - backoff.jitter.apply(delay) for the actual sleep
//! ```
//!
//! ## Defaults
//! - `BackoffPolicy::default()` → first=500ms, factor=2.0, max=120s, jitter=None.

mod backoff;
mod jitter;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
