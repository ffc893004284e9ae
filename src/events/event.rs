//! # Events emitted while registering push tokens.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Registration events**: the persisted registration was set, removed or resumed
//! - **Delivery events**: one token delivery's flow (starting, attempts, backoff, outcome)
//! - **Subscriber events**: fan-out problems (overflow, panic)
//!
//! The [`Event`] struct carries additional metadata such as timestamps, the
//! token, attempt numbers, HTTP status and backoff delays.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokenvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::BackoffScheduled)
//!     .with_token("i-am-token")
//!     .with_attempt(2)
//!     .with_delay(Duration::from_millis(1000));
//!
//! assert_eq!(ev.kind, EventKind::BackoffScheduled);
//! assert_eq!(ev.token.as_deref(), Some("i-am-token"));
//! assert_eq!(ev.delay_ms, Some(1000));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `subscriber`: subscriber name
    /// - `reason`: panic message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `subscriber`: subscriber name
    /// - `reason`: "full" or "closed"
    SubscriberOverflow,

    // === Registration events ===
    /// A registration endpoint was persisted.
    ///
    /// Sets:
    /// - `reason`: endpoint URL
    RegistrationSet,

    /// The persisted registration was removed.
    RegistrationRemoved,

    /// A pending token found at startup was dispatched for delivery.
    ///
    /// Sets:
    /// - `token`: pending token data
    PendingResumed,

    /// The persisted registration could not be read or parsed at startup.
    ///
    /// Sets:
    /// - `reason`: error message
    ResumeFailed,

    // === Delivery events ===
    /// A delivery started for a token.
    ///
    /// Sets:
    /// - `token`: token data
    DeliveryStarting,

    /// No registration is persisted; the delivery did nothing.
    ///
    /// Sets:
    /// - `token`: token data
    NotRegistered,

    /// The token was persisted as pending, before any network attempt.
    ///
    /// Sets:
    /// - `token`: token data
    PendingPersisted,

    /// The development flag could not be resolved; `false` is used.
    ///
    /// Sets:
    /// - `reason`: error message
    EnvironmentUnavailable,

    /// A delivery round failed and will be retried.
    ///
    /// Sets:
    /// - `token`: token data
    /// - `attempt`: round number (1-based)
    /// - `status`: HTTP status (server rejections only)
    /// - `reason`: transport error or response body
    AttemptFailed,

    /// The next round is scheduled.
    ///
    /// Sets:
    /// - `token`: token data
    /// - `attempt`: round that failed
    /// - `delay_ms`: base delay before the next round
    BackoffScheduled,

    /// The endpoint accepted the token and the pending marker was cleared.
    ///
    /// Sets:
    /// - `token`: token data
    /// - `attempt`: rounds it took
    DeliverySucceeded,

    /// The delivery ended without success and will not be retried.
    ///
    /// Sets:
    /// - `token`: token data
    /// - `reason`: error message
    DeliveryFailed,

    /// A newer call superseded the delivery. Expected, not a failure.
    ///
    /// Sets:
    /// - `token`: token data
    DeliverySuperseded,
}

/// Event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Push token data, if applicable.
    pub token: Option<Arc<str>>,
    /// Round number (starting from 1).
    pub attempt: Option<u32>,
    /// Backoff delay before the next round in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// HTTP status of a rejected round.
    pub status: Option<u16>,
    /// Human-readable reason (errors, response bodies, overflow details).
    pub reason: Option<Arc<str>>,
    /// Subscriber name for subscriber events.
    pub subscriber: Option<&'static str>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            token: None,
            attempt: None,
            delay_ms: None,
            status: None,
            reason: None,
            subscriber: None,
        }
    }

    /// Attaches the token data.
    #[inline]
    pub fn with_token(mut self, token: impl Into<Arc<str>>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Attaches a round number.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a backoff delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches an HTTP status.
    #[inline]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        let mut ev = Event::new(EventKind::SubscriberOverflow).with_reason(reason);
        ev.subscriber = Some(subscriber);
        ev
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        let mut ev = Event::new(EventKind::SubscriberPanicked).with_reason(info);
        ev.subscriber = Some(subscriber);
        ev
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }
}
