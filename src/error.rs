//! Error types used by tokenvisor.
//!
//! This module defines:
//!
//! - [`Superseded`] — a supervised call noticed a newer call at a suspension point.
//! - [`RegistrationError`] — why one token delivery ended without success.
//! - [`StoreError`] — failures of a [`RegistrationStore`](crate::RegistrationStore).
//! - [`HttpError`] — failures of an [`HttpClient`](crate::HttpClient).
//!
//! [`RegistrationError`] provides helper methods (`as_label`, `as_message`) for
//! logging and [`RegistrationError::is_retryable`] for the delivery loop.

use thiserror::Error;

/// A supervised call was superseded by a newer call or an abort.
///
/// Not a failure: [`Interruptible::call`](crate::Interruptible::call) turns it
/// into an abandoned (`Ok(None)`) result.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("superseded by a newer call")]
pub struct Superseded;

/// # Errors produced by a token delivery.
///
/// `TransientNetwork` and `ServerRejected` are retried inside the delivery
/// loop and only ever surface through events. The others end the delivery.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// The request never got a response (connection-level failure).
    #[error("transient network error: {error}")]
    TransientNetwork {
        /// The underlying error message.
        error: String,
    },

    /// The endpoint answered with a non-2xx status.
    #[error("server rejected registration with status {status}: {body}")]
    ServerRejected {
        /// HTTP status code.
        status: u16,
        /// Response body, kept for diagnostics.
        body: String,
    },

    /// The persisted registration could not be parsed.
    #[error("malformed persisted registration: {error}")]
    MalformedPersistedState {
        /// The parser's message.
        error: String,
    },

    /// Anything else raised during an attempt (e.g. the request could not be built).
    #[error("non-retryable delivery error: {error}")]
    NonRetryable {
        /// The underlying error message.
        error: String,
    },

    /// Reading or writing the persisted registration failed.
    #[error("registration store error: {0}")]
    Storage(#[from] StoreError),

    /// The delivery was superseded; never returned by a completed call.
    #[error(transparent)]
    Superseded(#[from] Superseded),
}

impl RegistrationError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use tokenvisor::RegistrationError;
    ///
    /// let err = RegistrationError::ServerRejected { status: 503, body: String::new() };
    /// assert_eq!(err.as_label(), "server_rejected");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RegistrationError::TransientNetwork { .. } => "transient_network",
            RegistrationError::ServerRejected { .. } => "server_rejected",
            RegistrationError::MalformedPersistedState { .. } => "malformed_persisted_state",
            RegistrationError::NonRetryable { .. } => "non_retryable",
            RegistrationError::Storage(_) => "storage",
            RegistrationError::Superseded(_) => "superseded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RegistrationError::TransientNetwork { error } => format!("network: {error}"),
            RegistrationError::ServerRejected { status, body } => {
                format!("status {status}: {body}")
            }
            RegistrationError::MalformedPersistedState { error } => format!("malformed: {error}"),
            RegistrationError::NonRetryable { error } => format!("fatal: {error}"),
            RegistrationError::Storage(e) => format!("storage: {e}"),
            RegistrationError::Superseded(_) => "superseded".to_string(),
        }
    }

    /// Indicates whether the delivery loop should try again.
    ///
    /// Returns `true` for [`RegistrationError::TransientNetwork`] and
    /// [`RegistrationError::ServerRejected`], `false` otherwise.
    ///
    /// # Example
    /// ```
    /// use tokenvisor::RegistrationError;
    ///
    /// let retryable = RegistrationError::TransientNetwork { error: "reset".into() };
    /// assert!(retryable.is_retryable());
    ///
    /// let fatal = RegistrationError::NonRetryable { error: "bad url".into() };
    /// assert!(!fatal.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RegistrationError::TransientNetwork { .. } | RegistrationError::ServerRejected { .. }
        )
    }
}

/// # Errors produced by a registration store.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying I/O failed.
    #[error("store i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

/// # Errors produced by an HTTP client.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum HttpError {
    /// Connection-level failure; the request may be retried.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The request could not be built or sent as specified.
    #[error("invalid request: {0}")]
    Request(String),
}

impl From<HttpError> for RegistrationError {
    fn from(e: HttpError) -> Self {
        match e {
            HttpError::Transport(error) => RegistrationError::TransientNetwork { error },
            HttpError::Request(error) => RegistrationError::NonRetryable { error },
        }
    }
}
