//! # tokenvisor
//!
//! **Tokenvisor** keeps a remote registration endpoint informed of a device's
//! current push token.
//!
//! The host sets a registration endpoint once. From then on, every token the
//! platform reports is POSTed there, retried with exponential backoff until
//! accepted, and remembered across restarts until it was. A newer token always
//! supersedes a delivery still in flight.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   TokenEmitter          start() / resume          set / remove registration
//!        │                       │                             │
//!        ▼                       ▼                             ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  AutoRegistration (facade)                                        │
//! │  - Interruptible<DevicePushToken, Delivery, RegistrationError>    │
//! │  - RegistrationStore / HttpClient / Environment                   │
//! │  - Bus (broadcast events)                                         │
//! └──────┬──────────────────────────────────────────────────────┬─────┘
//!        ▼                                                      │
//!  ┌───────────────────────────────┐                            │
//!  │ deliver(token, Suspend)       │                            │
//!  │  - read / persist pending     │ Publishes                  │
//!  │  - Retries { POST, backoff }  │ Events:                    │
//!  │  - clear pending              │ - DeliveryStarting         │
//!  └──────┬────────────────────────┘ - AttemptFailed            │
//!         │                          - BackoffScheduled ...     │
//!         ▼                                                     ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                      Bus (broadcast channel)                      │
//! │              (capacity: RegistrationConfig::bus_capacity)         │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │  subscriber_listener   │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                            (per-sub queues)
//!                          ┌────────┼─────────┐
//!                          ▼        ▼         ▼
//!                      LogWriter  sub2 ...  subN
//! ```
//!
//! ### Supersession
//! ```text
//! call(A) ──► gen 1 ── read ── persist A ── POST ✗ ── sleep ─┐
//! call(B) ──► gen 2 (gen 1 cancelled) ───────────────────────┴─► A abandoned (Ok(None))
//!                     └── read ── persist B ── POST ✓ ── clear ──► Ok(Some(Registered))
//! ```
//! A superseded delivery stops at its next suspension point (store access,
//! network round or backoff sleep) and never writes the store again.
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                              |
//! |-------------------|---------------------------------------------------------------|-------------------------------------------------|
//! | **Facade**        | Set/remove the endpoint, deliver tokens, resume at startup.   | [`AutoRegistration`]                            |
//! | **Supervision**   | Latest-call-wins execution with suspension points.            | [`Interruptible`], [`Suspend`]                  |
//! | **Retries**       | Lazy retry rounds with exponential backoff.                   | [`Retries`], [`RetrySignal`], [`BackoffPolicy`] |
//! | **Collaborators** | Storage, HTTP and environment seams.                          | [`RegistrationStore`], [`HttpClient`], [`Environment`] |
//! | **Subscriber API**| Hook into delivery events (logging, metrics).                 | [`Subscribe`], [`LogWriter`]                    |
//! | **Errors**        | Typed errors for deliveries and collaborators.                | [`RegistrationError`], [`StoreError`], [`HttpError`] |
//! | **Configuration** | Backoff and bus settings.                                     | [`RegistrationConfig`]                          |
//!
//! ## Optional features
//! - `reqwest-client` (default): exports [`ReqwestClient`].
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use serde_json::{Map, json};
//! use tokenvisor::{
//!     AutoRegistration, DevicePushToken, FileStore, HttpClient, HttpError, HttpResponse,
//!     StaticEnvironment, TokenEmitter,
//! };
//!
//! // With the `reqwest-client` feature, `tokenvisor::ReqwestClient` does this for real.
//! struct Gateway;
//!
//! #[async_trait]
//! impl HttpClient for Gateway {
//!     async fn post(&self, _: &str, _: &[(&str, &str)], _: String) -> Result<HttpResponse, HttpError> {
//!         Ok(HttpResponse::new(200, ""))
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registration = AutoRegistration::builder(
//!         Arc::new(FileStore::new("registration.json")),
//!         Arc::new(Gateway),
//!         Arc::new(StaticEnvironment::production()),
//!     )
//!     .build();
//!
//!     // Finish a delivery interrupted in a previous run.
//!     registration.start().await?;
//!
//!     let mut body = Map::new();
//!     body.insert("userId".into(), json!("42"));
//!     registration
//!         .set_auto_registration("https://example.com/push-tokens", body)
//!         .await?;
//!
//!     let emitter = TokenEmitter::default();
//!     let _listener = registration.listen(&emitter);
//!     emitter.emit(DevicePushToken::ios("i-am-token"));
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod events;
mod policies;
mod registration;
mod retry;
mod subscribers;
mod supervisor;

// ---- Public re-exports ----

pub use config::RegistrationConfig;
pub use error::{HttpError, RegistrationError, StoreError, Superseded};
pub use events::{Bus, Event, EventKind};
pub use policies::{BackoffPolicy, JitterPolicy};
pub use registration::{
    AutoRegistration, AutoRegistrationBuilder, Delivery, DeliveryOutcome, DevicePushToken,
    Environment, FileStore, HttpClient, HttpResponse, MemoryStore, Platform, Registration,
    RegistrationStore, StaticEnvironment, TokenEmitter,
};
#[cfg(feature = "reqwest-client")]
pub use registration::ReqwestClient;
pub use retry::{Retries, RetrySignal, Round};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
pub use supervisor::{BoxTaskFuture, Interruptible, Suspend};
