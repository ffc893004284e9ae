use std::sync::Arc;

use crate::config::RegistrationConfig;
use crate::error::RegistrationError;
use crate::events::Bus;
use crate::subscribers::{LogWriter, Subscribe, SubscriberSet};
use crate::supervisor::Interruptible;

use super::auto::AutoRegistration;
use super::environment::Environment;
use super::http::HttpClient;
use super::model::DevicePushToken;
use super::store::RegistrationStore;
use super::workflow::{Delivery, DeliveryContext, deliver};

/// Builder for [`AutoRegistration`].
pub struct AutoRegistrationBuilder {
    store: Arc<dyn RegistrationStore>,
    http: Arc<dyn HttpClient>,
    environment: Arc<dyn Environment>,
    cfg: RegistrationConfig,
    subscribers: Option<Vec<Arc<dyn Subscribe>>>,
}

impl AutoRegistrationBuilder {
    pub(crate) fn new(
        store: Arc<dyn RegistrationStore>,
        http: Arc<dyn HttpClient>,
        environment: Arc<dyn Environment>,
    ) -> Self {
        Self {
            store,
            http,
            environment,
            cfg: RegistrationConfig::default(),
            subscribers: None,
        }
    }

    pub fn with_config(mut self, cfg: RegistrationConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Replaces the default subscribers (a single [`LogWriter`]).
    ///
    /// Pass an empty vector to run without any.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = Some(subscribers);
        self
    }

    /// Builds the facade and starts forwarding events to subscribers.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn build(self) -> AutoRegistration {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subscribers = self
            .subscribers
            .unwrap_or_else(|| vec![Arc::new(LogWriter::new()) as Arc<dyn Subscribe>]);
        let subs = Arc::new(SubscriberSet::new(subscribers, bus.clone()));

        let ctx = Arc::new(DeliveryContext {
            store: self.store,
            http: self.http,
            environment: self.environment,
            backoff: self.cfg.backoff,
            bus: bus.clone(),
        });
        let updater: Interruptible<DevicePushToken, Delivery, RegistrationError> = Interruptible::new({
            let ctx = Arc::clone(&ctx);
            move |token, suspend| deliver(Arc::clone(&ctx), token, suspend)
        });

        let registration = AutoRegistration::new_internal(ctx, updater);
        registration.subscriber_listener(subs);
        registration
    }
}
