//! # LogWriter — events rendered through `tracing`
//!
//! Installed by default on every [`AutoRegistration`](crate::AutoRegistration).
//! Lifecycle events go to `debug`, failures to `warn`. Supersession is logged
//! at `debug`: it is the expected outcome of a newer call, not a failure.
//!
//! ## Example output (with a fmt subscriber)
//! ```text
//! DEBUG tokenvisor: delivery starting token="i-am-token"
//! DEBUG tokenvisor: registration attempt failed, will retry token="i-am-token" attempt=1 status=Some(500) reason="Server error"
//! DEBUG tokenvisor: backoff scheduled token="i-am-token" after_attempt=1 delay_ms=500
//! DEBUG tokenvisor: token registered token="i-am-token" attempts=2
//!  WARN tokenvisor: token delivery failed token="i-am-token" reason="malformed: ..."
//! ```

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let token = e.token.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");

        match e.kind {
            EventKind::RegistrationSet => {
                debug!(target: "tokenvisor", endpoint = reason, "auto registration set");
            }
            EventKind::RegistrationRemoved => {
                debug!(target: "tokenvisor", "auto registration removed");
            }
            EventKind::PendingResumed => {
                debug!(target: "tokenvisor", token, "resuming pending token delivery");
            }
            EventKind::ResumeFailed => {
                warn!(
                    target: "tokenvisor",
                    reason,
                    "error encountered while fetching last registration information for auto token updates"
                );
            }
            EventKind::DeliveryStarting => {
                debug!(target: "tokenvisor", token, "delivery starting");
            }
            EventKind::NotRegistered => {
                debug!(target: "tokenvisor", token, "no registration persisted, nothing to deliver");
            }
            EventKind::PendingPersisted => {
                debug!(target: "tokenvisor", token, "pending token persisted");
            }
            EventKind::EnvironmentUnavailable => {
                warn!(target: "tokenvisor", reason, "could not resolve development flag, assuming production");
            }
            EventKind::AttemptFailed => {
                debug!(
                    target: "tokenvisor",
                    token,
                    attempt = ?e.attempt,
                    status = ?e.status,
                    reason,
                    "registration attempt failed, will retry"
                );
            }
            EventKind::BackoffScheduled => {
                debug!(
                    target: "tokenvisor",
                    token,
                    after_attempt = ?e.attempt,
                    delay_ms = ?e.delay_ms,
                    "backoff scheduled"
                );
            }
            EventKind::DeliverySucceeded => {
                debug!(target: "tokenvisor", token, attempts = ?e.attempt, "token registered");
            }
            EventKind::DeliveryFailed => {
                warn!(target: "tokenvisor", token, reason, "token delivery failed");
            }
            EventKind::DeliverySuperseded => {
                debug!(target: "tokenvisor", token, "delivery superseded by a newer call");
            }
            EventKind::SubscriberOverflow => {
                warn!(target: "tokenvisor", subscriber = ?e.subscriber, reason, "subscriber dropped event");
            }
            EventKind::SubscriberPanicked => {
                warn!(target: "tokenvisor", subscriber = ?e.subscriber, reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
