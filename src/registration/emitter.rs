//! # Token change notifications.
//!
//! [`TokenEmitter`] is where the host announces new device push tokens.
//! [`AutoRegistration::listen`](crate::AutoRegistration::listen) subscribes to it.

use tokio::sync::broadcast;

use super::model::DevicePushToken;

/// Broadcast source of device push tokens.
///
/// Cheap to clone. Tokens emitted while nobody listens are dropped.
#[derive(Clone, Debug)]
pub struct TokenEmitter {
    tx: broadcast::Sender<DevicePushToken>,
}

impl TokenEmitter {
    /// Creates an emitter buffering up to `capacity` tokens per listener (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Announces a new token; returns the number of listeners it reached.
    pub fn emit(&self, token: DevicePushToken) -> usize {
        self.tx.send(token).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DevicePushToken> {
        self.tx.subscribe()
    }
}

impl Default for TokenEmitter {
    fn default() -> Self {
        Self::new(16)
    }
}
