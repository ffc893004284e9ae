//! # Suspension points.
//!
//! A supervised task receives a [`Suspend`] and routes every asynchronous
//! sub-result it depends on through it. Each pass checks that the call's
//! generation is still current; once it is not, the task gets
//! [`Superseded`] and is expected to return it with `?`.
//!
//! ```text
//! point(fut):          check ──► fut.await ──► check ──► Ok(out)
//! interruptible(fut):  check ──► select { fut.await, superseded } ──► check ──► Ok(out)
//!                        │                        │                     │
//!                        └──────── Err(Superseded) ◄────────────────────┘
//! ```
//!
//! Work between two suspension points is never interrupted.

use std::future::Future;
use std::sync::Arc;

use crate::error::Superseded;
use crate::supervisor::generation::{Generation, Generations};

/// Suspension-point handle for one supervised call.
#[derive(Clone)]
pub struct Suspend {
    generations: Arc<Generations>,
    generation: Generation,
}

impl Suspend {
    pub(crate) fn new(generations: Arc<Generations>, generation: Generation) -> Self {
        Self {
            generations,
            generation,
        }
    }

    /// Returns true while no newer call or abort has superseded this call.
    pub fn is_current(&self) -> bool {
        self.generations.is_current(self.generation.id)
    }

    /// Fails with [`Superseded`] if this call is no longer current.
    pub fn check(&self) -> Result<(), Superseded> {
        if self.is_current() {
            Ok(())
        } else {
            Err(Superseded)
        }
    }

    /// Suspends on `fut`.
    ///
    /// `fut` is not polled at all if the call is already superseded, and its
    /// output is not handed back if the call was superseded while waiting.
    pub async fn point<F: Future>(&self, fut: F) -> Result<F::Output, Superseded> {
        self.check()?;
        let out = fut.await;
        self.check()?;
        Ok(out)
    }

    /// Suspends on `fut`, dropping it as soon as the call is superseded.
    ///
    /// Use for waits with no side effect worth finishing (backoff sleeps,
    /// idempotent requests).
    pub async fn interruptible<F: Future>(&self, fut: F) -> Result<F::Output, Superseded> {
        self.check()?;
        let out = tokio::select! {
            biased;
            _ = self.generation.cancel.cancelled() => return Err(Superseded),
            out = fut => out,
        };
        self.check()?;
        Ok(out)
    }
}
