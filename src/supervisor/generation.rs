//! # Generation bookkeeping.
//!
//! A generation is minted per [`Interruptible::call`](crate::Interruptible::call).
//! Identity is a counter value compared for equality; the counter only ever
//! grows, so a superseded identity can never become current again.
//!
//! Each generation also owns a [`CancellationToken`], cancelled the moment the
//! generation is superseded, so interruptible waits can stop early.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;

struct Current {
    /// `0` means "never set".
    id: u64,
    cancel: CancellationToken,
    /// Set by the first `begin` or `abort`: the identity has been replaced at least once.
    started: bool,
}

/// Shared state behind one [`Interruptible`](crate::Interruptible).
pub(crate) struct Generations {
    current: Mutex<Current>,
}

/// Identity captured by one call.
#[derive(Clone, Debug)]
pub(crate) struct Generation {
    pub(crate) id: u64,
    pub(crate) cancel: CancellationToken,
}

impl Generations {
    pub(crate) fn new() -> Self {
        Self {
            current: Mutex::new(Current {
                id: 0,
                cancel: CancellationToken::new(),
                started: false,
            }),
        }
    }

    /// Supersedes the current generation and returns the new one.
    pub(crate) fn begin(&self) -> Generation {
        let mut current = self.lock();
        let generation = Self::replace(&mut current);
        current.started = true;
        generation
    }

    /// Supersedes the current generation with one no call holds.
    pub(crate) fn abort(&self) {
        let mut current = self.lock();
        Self::replace(&mut current);
        current.started = true;
    }

    pub(crate) fn is_current(&self, id: u64) -> bool {
        self.lock().id == id
    }

    pub(crate) fn has_started(&self) -> bool {
        self.lock().started
    }

    fn replace(current: &mut Current) -> Generation {
        current.cancel.cancel();
        current.id += 1;
        current.cancel = CancellationToken::new();
        Generation {
            id: current.id,
            cancel: current.cancel.clone(),
        }
    }

    // Critical sections never panic, so a poisoned lock still holds consistent state.
    fn lock(&self) -> MutexGuard<'_, Current> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
