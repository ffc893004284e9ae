//! Supervision: latest-call-wins execution of suspendable tasks.
//!
//! The only public types from this module are [`Interruptible`] and
//! [`Suspend`]; the task shape is `Fn(Args, Suspend) -> Future<Output = Result<T, E>>`
//! where `E: From<Superseded>` lets the task bail out with `?`.
//!
//! Internal modules:
//! - `generation`: mints and compares generation identities;
//! - `suspend`: suspension points that check the generation;
//! - `interruptible`: the call / has_run / abort surface.

mod generation;
mod interruptible;
mod suspend;

pub use interruptible::{BoxTaskFuture, Interruptible};
pub use suspend::Suspend;
