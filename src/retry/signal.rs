use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Handle passed to each attempt; marks the current round as retryable.
///
/// Cloneable so it can be moved into nested futures or error handlers. A
/// fresh signal is handed out per round; retrying through a stale one has no
/// effect on later rounds.
#[derive(Clone, Debug, Default)]
pub struct RetrySignal {
    requested: Arc<AtomicBool>,
}

impl RetrySignal {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Requests another round after this one.
    pub fn retry(&self) {
        self.requested.store(true, Ordering::Release);
    }

    /// Returns true if [`retry`](Self::retry) was called for this round.
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }
}
