//! # Event bus for broadcasting delivery events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`]. Deliveries and the
//! [`AutoRegistration`](crate::AutoRegistration) facade publish; a single
//! listener forwards to the [`SubscriberSet`](crate::SubscriberSet).
//!
//! ```text
//! Publishers:                         Subscriber (one):
//!   workflow::deliver ──┐
//!   AutoRegistration  ──┼──► Bus ───► listener ────► SubscriberSet ──► LogWriter, ...
//!   SubscriberSet     ──┘
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks.
//! - **Bounded capacity**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: events are lost if there are no active subscribers at send time.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for events.
///
/// Cheap to clone (internally holds an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active receivers; dropped if there are none.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver that will observe subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn test_publish_reaches_receivers() {
        let bus = Bus::new(0);
        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::RegistrationRemoved));
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::RegistrationRemoved);
    }

    #[test]
    fn test_publish_without_receivers_is_silent() {
        Bus::new(4).publish(Event::new(EventKind::RegistrationRemoved));
    }
}
