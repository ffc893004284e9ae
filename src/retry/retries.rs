//! # Round-by-round retry driver.
//!
//! ## Rules
//! - Rounds run **sequentially**; the attempt future of one round completes before the next starts
//! - The first round runs **immediately** (no pre-delay)
//! - The sleep for a retry happens at the **start** of the following [`Retries::next`] call
//! - Delay grows **once per retry-requested round**: `min(max, delay × factor)`
//! - An attempt error **settles** the sequence and is returned as-is

use std::future::Future;
use std::time::Duration;

use futures::Stream;
use tokio::time;

use crate::policies::BackoffPolicy;
use crate::retry::signal::RetrySignal;

/// Outcome of one round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Round<T> {
    /// The attempt asked for another round; its value is intermediate.
    Retrying(T),
    /// The attempt did not ask for another round; the sequence is settled.
    Done(T),
}

impl<T> Round<T> {
    /// Returns true for [`Round::Done`].
    pub fn is_done(&self) -> bool {
        matches!(self, Round::Done(_))
    }

    /// Unwraps the round's value.
    pub fn into_inner(self) -> T {
        match self {
            Round::Retrying(v) | Round::Done(v) => v,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// No round has run yet.
    Fresh,
    /// The last round asked for a retry; sleep before the next.
    Backoff,
    /// Settled by `Done` or an error.
    Settled,
}

/// Lazy retry sequence over an attempt closure.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use tokenvisor::{BackoffPolicy, Retries, RetrySignal, Round};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let backoff = BackoffPolicy { first: Duration::ZERO, ..BackoffPolicy::default() };
/// let mut calls = 0;
/// let mut retries = Retries::new(backoff, |signal: RetrySignal| {
///     calls += 1;
///     let n = calls;
///     async move {
///         if n < 3 {
///             signal.retry();
///         }
///         Ok::<_, std::io::Error>(n)
///     }
/// });
///
/// assert_eq!(retries.next().await.unwrap().unwrap(), Round::Retrying(1));
/// assert_eq!(retries.next().await.unwrap().unwrap(), Round::Retrying(2));
/// assert_eq!(retries.next().await.unwrap().unwrap(), Round::Done(3));
/// assert!(retries.next().await.is_none());
/// # }
/// ```
pub struct Retries<F> {
    attempt: F,
    backoff: BackoffPolicy,
    delay: Duration,
    rounds: u32,
    state: State,
}

impl<F> Retries<F> {
    /// Creates a retry sequence; nothing runs until the first [`next`](Self::next).
    pub fn new(backoff: BackoffPolicy, attempt: F) -> Self {
        Self {
            attempt,
            backoff,
            delay: backoff.first,
            rounds: 0,
            state: State::Fresh,
        }
    }

    /// Number of rounds started so far.
    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    /// Delay that will be slept before the next round if the last one asked for a retry.
    pub fn pending_delay(&self) -> Duration {
        self.delay
    }

    /// Returns true once the sequence has produced its final round or an error.
    pub fn is_settled(&self) -> bool {
        self.state == State::Settled
    }
}

impl<F, Fut, T, E> Retries<F>
where
    F: FnMut(RetrySignal) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    /// Runs the next round, sleeping first if the previous round asked for a retry.
    ///
    /// Returns `None` once settled. Dropping the returned future during the
    /// backoff sleep leaves the sequence in its pre-sleep state.
    pub async fn next(&mut self) -> Option<Result<Round<T>, E>> {
        match self.state {
            State::Settled => return None,
            State::Backoff => {
                time::sleep(self.backoff.sleep_for(self.delay)).await;
                self.delay = self.backoff.grow(self.delay);
            }
            State::Fresh => {}
        }

        let signal = RetrySignal::new();
        self.rounds += 1;
        // Settle first so a future dropped mid-attempt does not leave a retryable state behind.
        self.state = State::Settled;

        match (self.attempt)(signal.clone()).await {
            Err(e) => Some(Err(e)),
            Ok(value) if signal.is_requested() => {
                self.state = State::Backoff;
                Some(Ok(Round::Retrying(value)))
            }
            Ok(value) => Some(Ok(Round::Done(value))),
        }
    }

    /// Drives the sequence to its final value.
    ///
    /// Returns `None` if the sequence was already settled.
    pub async fn settle(mut self) -> Option<Result<T, E>> {
        loop {
            let round = match self.next().await? {
                Ok(round) => round,
                Err(e) => return Some(Err(e)),
            };
            if round.is_done() {
                return Some(Ok(round.into_inner()));
            }
        }
    }

    /// Exposes the rounds as a [`Stream`].
    pub fn into_stream(self) -> impl Stream<Item = Result<Round<T>, E>> {
        futures::stream::unfold(self, |mut retries| async move {
            retries.next().await.map(|round| (round, retries))
        })
    }
}
