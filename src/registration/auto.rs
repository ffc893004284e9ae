//! # AutoRegistration: keeps a registration endpoint informed of the device push token.
//!
//! The facade owns one supervised delivery slot. Every new token (from
//! [`listen`](AutoRegistration::listen), [`update_push_token`](AutoRegistration::update_push_token)
//! or a resume at startup) supersedes whatever delivery is in flight.
//! Changing or removing the registration aborts it too.
//!
//! ```text
//! TokenEmitter ──► listen() ──► update_push_token(token) ──► tokio::spawn(deliver(token))
//!                                        │
//!                                        └─ Interruptible::call: supersedes the previous call
//!
//! start() ──► store.get_registration() ──► resume_persisted_registration(value)
//!                                              └─ pending token and slot untouched? ──► update_push_token
//!
//! set_auto_registration / remove_auto_registration ──► abort() ──► store.set_registration(..)
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use serde_json::Map;
//! use tokenvisor::{
//!     AutoRegistration, Delivery, DevicePushToken, HttpClient, HttpError, HttpResponse, MemoryStore,
//!     StaticEnvironment,
//! };
//!
//! struct Accepting;
//!
//! #[async_trait]
//! impl HttpClient for Accepting {
//!     async fn post(&self, _: &str, _: &[(&str, &str)], _: String) -> Result<HttpResponse, HttpError> {
//!         Ok(HttpResponse::new(200, ""))
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), tokenvisor::RegistrationError> {
//! let registration = AutoRegistration::builder(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(Accepting),
//!     Arc::new(StaticEnvironment::production()),
//! )
//! .build();
//!
//! assert!(registration.start().await?.is_none());
//! registration
//!     .set_auto_registration("https://example.com/push", Map::new())
//!     .await?;
//!
//! let outcome = registration.deliver(DevicePushToken::ios("i-am-token")).await?;
//! assert_eq!(outcome, Some(Delivery::Registered { attempts: 1 }));
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use crate::error::RegistrationError;
use crate::events::{Event, EventKind};
use crate::subscribers::SubscriberSet;
use crate::supervisor::Interruptible;

use super::builder::AutoRegistrationBuilder;
use super::emitter::TokenEmitter;
use super::environment::Environment;
use super::http::HttpClient;
use super::model::{DevicePushToken, Registration};
use super::store::RegistrationStore;
use super::workflow::{Delivery, DeliveryContext};

/// Result of one delivery call: `Ok(None)` when it was superseded.
pub type DeliveryOutcome = Result<Option<Delivery>, RegistrationError>;

/// Automatic device push token registration.
///
/// Cheap to clone; clones share the delivery slot and the event bus.
#[derive(Clone)]
pub struct AutoRegistration {
    ctx: Arc<DeliveryContext>,
    updater: Interruptible<DevicePushToken, Delivery, RegistrationError>,
}

impl AutoRegistration {
    /// Starts building a facade over the given collaborators.
    pub fn builder(
        store: Arc<dyn RegistrationStore>,
        http: Arc<dyn HttpClient>,
        environment: Arc<dyn Environment>,
    ) -> AutoRegistrationBuilder {
        AutoRegistrationBuilder::new(store, http, environment)
    }

    pub(crate) fn new_internal(
        ctx: Arc<DeliveryContext>,
        updater: Interruptible<DevicePushToken, Delivery, RegistrationError>,
    ) -> Self {
        Self { ctx, updater }
    }

    /// Forwards bus events to the subscriber set (fire-and-forget).
    pub(crate) fn subscriber_listener(&self, subs: Arc<SubscriberSet>) {
        let mut rx = self.ctx.bus.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => subs.emit(&ev),
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                }
            }
        });
    }

    /// Observes events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.ctx.bus.subscribe()
    }

    /// Persists a new registration endpoint.
    ///
    /// Any in-flight delivery is aborted first: it was aimed at the old
    /// registration. The new registration carries no pending token.
    pub async fn set_auto_registration(
        &self,
        endpoint: impl Into<String>,
        body: Map<String, Value>,
    ) -> Result<(), RegistrationError> {
        self.updater.abort();
        let registration = Registration::new(endpoint, body);
        self.ctx
            .store
            .set_registration(Some(registration.to_json()?))
            .await?;
        self.ctx.bus.publish(
            Event::new(EventKind::RegistrationSet).with_reason(registration.endpoint.as_str()),
        );
        Ok(())
    }

    /// Forgets the registration; later tokens are not sent anywhere.
    pub async fn remove_auto_registration(&self) -> Result<(), RegistrationError> {
        self.updater.abort();
        self.ctx.store.set_registration(None).await?;
        self.ctx
            .bus
            .publish(Event::new(EventKind::RegistrationRemoved));
        Ok(())
    }

    /// Starts delivering `token`, superseding any earlier delivery right away.
    ///
    /// The supersession happens when this method is called, not when the
    /// returned future is first polled. Outcomes other than success are also
    /// published as events.
    pub fn deliver(
        &self,
        token: DevicePushToken,
    ) -> impl Future<Output = DeliveryOutcome> + Send + use<> {
        let label: Arc<str> = token.data.as_str().into();
        let call = self.updater.call(token);
        let bus = self.ctx.bus.clone();

        async move {
            let outcome = call.await;
            match &outcome {
                Ok(Some(_)) => {}
                Ok(None) => {
                    bus.publish(Event::new(EventKind::DeliverySuperseded).with_token(label));
                }
                Err(e) => {
                    bus.publish(
                        Event::new(EventKind::DeliveryFailed)
                            .with_token(label)
                            .with_reason(e.as_message()),
                    );
                }
            }
            outcome
        }
    }

    /// Delivers `token` in the background.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn update_push_token(&self, token: DevicePushToken) -> JoinHandle<DeliveryOutcome> {
        tokio::spawn(self.deliver(token))
    }

    /// Resumes a delivery interrupted in a previous run.
    ///
    /// `persisted` is the store's value at startup. A delivery is dispatched
    /// only if it names a pending token and the delivery slot is untouched in
    /// this process: no delivery has started and the registration was not set,
    /// removed or aborted since. A newer token or registration always wins
    /// over the persisted one. Empty or unreadable values are reported and
    /// ignored.
    pub fn resume_persisted_registration(
        &self,
        persisted: Option<&str>,
    ) -> Option<JoinHandle<DeliveryOutcome>> {
        let raw = persisted.filter(|raw| !raw.is_empty())?;
        let registration = match Registration::parse(raw) {
            Ok(registration) => registration,
            Err(e) => {
                self.ctx.bus.publish(
                    Event::new(EventKind::ResumeFailed).with_reason(e.as_message()),
                );
                return None;
            }
        };

        let token = registration.pending_token?;
        if self.has_push_token_been_updated() {
            return None;
        }
        self.ctx
            .bus
            .publish(Event::new(EventKind::PendingResumed).with_token(token.data.as_str()));
        Some(self.update_push_token(token))
    }

    /// Reads the store and resumes an interrupted delivery, if any.
    pub async fn start(&self) -> Result<Option<JoinHandle<DeliveryOutcome>>, RegistrationError> {
        let persisted = match self.ctx.store.get_registration().await {
            Ok(persisted) => persisted,
            Err(e) => {
                let e = RegistrationError::from(e);
                self.ctx.bus.publish(
                    Event::new(EventKind::ResumeFailed).with_reason(e.as_message()),
                );
                return Err(e);
            }
        };
        Ok(self.resume_persisted_registration(persisted.as_deref()))
    }

    /// Delivers every token announced on `emitter`, for as long as it lives.
    pub fn listen(&self, emitter: &TokenEmitter) -> JoinHandle<()> {
        let mut rx = emitter.subscribe();
        let registration = self.clone();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(token) => {
                        registration.update_push_token(token);
                    }
                    // Only the newest token matters.
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    /// True once any delivery has started, or an abort happened, in this process.
    ///
    /// Setting or removing the registration aborts, so it counts too.
    pub fn has_push_token_been_updated(&self) -> bool {
        self.updater.has_run()
    }

    /// Abandons the in-flight delivery at its next suspension point.
    pub fn abort_updating_push_token(&self) {
        self.updater.abort();
    }
}
