//! # Core subscriber trait
//!
//! `Subscribe` is the extension point for plugging custom event handlers into
//! token registration. Each subscriber is driven by a dedicated worker loop fed
//! by a bounded queue owned by the [`SubscriberSet`](crate::SubscriberSet).
//!
//! ## Contract
//! - Implementations may be slow (I/O, batching); they do **not** block
//!   deliveries nor other subscribers.
//! - If a subscriber's queue overflows, events for that subscriber are
//!   **dropped** and a `SubscriberOverflow` event is published.

use async_trait::async_trait;

use crate::events::Event;

/// Contract for event subscribers.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single event for this subscriber.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
