//! # Interruptible: latest-call-wins task wrapper.
//!
//! ## Architecture
//! ```text
//! call(args) ──► Generations::begin()          (synchronous: previous call superseded here)
//!            └─► task(args, Suspend) ──► future returned to caller
//!
//! future.await:
//!   task runs until it returns
//!     ├─ Ok(v)                          ──► Ok(Some(v))
//!     ├─ Err(e), generation current     ──► Err(e)
//!     └─ Err(e), generation superseded  ──► Ok(None)   (abandoned; e discarded)
//! ```
//!
//! ## Rules
//! - Only **one** generation is current; every `call` and `abort` supersedes it
//! - A call minted before an `abort` still runs up to its **first suspension point**
//! - Errors of a superseded call are **discarded**: abandoned work never reports failures
//! - A call that returns `Ok` after its last suspension point keeps its value

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::supervisor::generation::Generations;
use crate::supervisor::suspend::Suspend;

/// Boxed supervised-task future.
pub type BoxTaskFuture<T, E> = BoxFuture<'static, Result<T, E>>;

type TaskFn<A, T, E> = dyn Fn(A, Suspend) -> BoxTaskFuture<T, E> + Send + Sync;

/// Wraps a suspendable task so that each call supersedes the previous ones.
///
/// Cheap to clone; clones share the generation state.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use tokenvisor::{Interruptible, Superseded, Suspend};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let doubler = Interruptible::new(|n: u32, suspend: Suspend| async move {
///     suspend.point(tokio::time::sleep(Duration::from_millis(10))).await?;
///     Ok::<_, Superseded>(n * 2)
/// });
///
/// let first = doubler.call(1);
/// let second = doubler.call(2);
/// assert_eq!(first.await, Ok(None));
/// assert_eq!(second.await, Ok(Some(4)));
/// # }
/// ```
pub struct Interruptible<A, T, E> {
    generations: Arc<Generations>,
    task: Arc<TaskFn<A, T, E>>,
}

impl<A, T, E> Clone for Interruptible<A, T, E> {
    fn clone(&self) -> Self {
        Self {
            generations: Arc::clone(&self.generations),
            task: Arc::clone(&self.task),
        }
    }
}

impl<A, T, E> Interruptible<A, T, E>
where
    A: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    /// Wraps `task`. The closure is invoked once per [`call`](Self::call).
    pub fn new<F, Fut>(task: F) -> Self
    where
        F: Fn(A, Suspend) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let task: Arc<TaskFn<A, T, E>> = Arc::new(move |args, suspend| Box::pin(task(args, suspend)));
        Self {
            generations: Arc::new(Generations::new()),
            task,
        }
    }

    /// Starts a new call, superseding any earlier one immediately.
    ///
    /// The returned future resolves to:
    /// - `Ok(Some(value))` when the task finished;
    /// - `Err(e)` when the task failed while still current;
    /// - `Ok(None)` when the call was abandoned.
    pub fn call(&self, args: A) -> impl Future<Output = Result<Option<T>, E>> + Send + use<A, T, E> {
        let suspend = Suspend::new(Arc::clone(&self.generations), self.generations.begin());
        let fut = (self.task)(args, suspend.clone());

        async move {
            match fut.await {
                Ok(value) => Ok(Some(value)),
                Err(e) if suspend.is_current() => Err(e),
                Err(_) => Ok(None),
            }
        }
    }

    /// Returns true once any call has begun or [`abort`](Self::abort) was called.
    ///
    /// Says nothing about completion.
    pub fn has_run(&self) -> bool {
        self.generations.has_started()
    }

    /// Supersedes the in-flight call, if any; it abandons at its next suspension point.
    pub fn abort(&self) {
        self.generations.abort();
    }
}
