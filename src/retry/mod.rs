//! # Retry driver.
//!
//! [`Retries`] runs an attempt closure one round at a time. Each round the
//! closure receives a [`RetrySignal`]; calling [`RetrySignal::retry`] before
//! the round's future completes asks for another round after a backoff sleep.
//!
//! ```text
//! next() ──► attempt(signal) ──► Ok(v), retry() called  ──► Round::Retrying(v)
//!   ▲                       ├──► Ok(v), no retry        ──► Round::Done(v)   (settled)
//!   │                       └──► Err(e)                 ──► Err(e)           (settled)
//!   │
//!   └── next() after Retrying: sleep(delay), delay = min(max, delay × factor), attempt again
//! ```
//!
//! There is no retry limit. Callers that want one count rounds themselves or
//! stop calling [`Retries::next`].

mod retries;
mod signal;

pub use retries::{Retries, Round};
pub use signal::RetrySignal;
