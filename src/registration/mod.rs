//! # Device push token registration.
//!
//! - [`AutoRegistration`] the facade: persisted endpoint, token delivery, resume.
//! - [`Registration`] / [`DevicePushToken`] the persisted data model.
//! - [`RegistrationStore`], [`HttpClient`], [`Environment`], [`TokenEmitter`]
//!   the collaborators the host provides or picks stock implementations of.
//!
//! Each delivery persists the token as pending, POSTs it until the endpoint
//! accepts it, then clears the pending marker. See the `workflow` module docs
//! for the exact sequence.

mod auto;
mod builder;
mod emitter;
mod environment;
mod http;
mod model;
mod store;
mod workflow;

#[cfg(test)]
mod testing;

pub use auto::{AutoRegistration, DeliveryOutcome};
pub use builder::AutoRegistrationBuilder;
pub use emitter::TokenEmitter;
pub use environment::{Environment, StaticEnvironment};
#[cfg(feature = "reqwest-client")]
pub use http::ReqwestClient;
pub use http::{HttpClient, HttpResponse};
pub use model::{DevicePushToken, Platform, Registration};
pub use store::{FileStore, MemoryStore, RegistrationStore};
pub use workflow::Delivery;
