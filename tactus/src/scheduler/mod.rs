//! Registration entry points for hosts.
//!
//! A [`Scheduler`] owns a [`Pool`] of coroutines and hands back a
//! [`CoroutineHandle`] for every routine it runs. The host calls
//! [`Scheduler::update`] once per tick.
//!
//! [`ContextScheduler`] additionally threads a [`SharedContext`] into every
//! routine factory so that independently scheduled routines can coordinate.

mod builder;
mod context;

pub use builder::SchedulerBuilder;
pub use context::{ContextScheduler, SharedContext};

use crate::context as tick;
use crate::coroutine::{Coroutine, CoroutineHandle};
use crate::pool::Pool;
use crate::routine::{Co, Routine};
use crate::status::Status;

use std::fmt;
use std::future::Future;

use tracing::{debug, trace_span};

/// Name given to schedulers built without an explicit one.
pub(crate) const DEFAULT_NAME: &str = "tactus";

/// Runs coroutines on behalf of a host tick loop.
///
/// Every coroutine registered with [`run`](Self::run) is advanced once per
/// [`update`](Self::update) and dropped from the scheduler as soon as it
/// finishes. The returned [`CoroutineHandle`] stays valid afterwards, so
/// the caller can still read the result.
///
/// # Examples
///
/// ```rust,ignore
/// let scheduler = Scheduler::new();
///
/// let handle = scheduler.run_async(|co: Co<u32>| async move {
///     co.wait(delay(Duration::from_millis(10))).await;
///     co.finish(42).await;
/// });
///
/// while scheduler.update() {
///     // one frame of the host loop
/// }
///
/// assert_eq!(handle.take_result(), Some(42));
/// ```
pub struct Scheduler {
    name: String,
    pool: Pool,
}

impl Scheduler {
    /// Creates a scheduler with the default configuration.
    pub fn new() -> Self {
        SchedulerBuilder::new().build()
    }

    /// Returns a [`SchedulerBuilder`] to configure a scheduler.
    pub fn builder() -> SchedulerBuilder {
        SchedulerBuilder::new()
    }

    pub(crate) fn with_config(name: String, capacity: usize) -> Self {
        Self {
            name,
            pool: Pool::with_capacity(capacity),
        }
    }

    /// Name attached to this scheduler's tracing spans.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Builds a coroutine from `factory`, registers it and returns a handle
    /// to it.
    ///
    /// The routine is not materialized until the next
    /// [`update`](Self::update).
    pub fn run<T, F, R>(&self, factory: F) -> CoroutineHandle<T>
    where
        T: Send + 'static,
        F: FnMut() -> R + Send + 'static,
        R: Routine<T> + 'static,
    {
        self.spawn(Coroutine::new(factory))
    }

    /// Registers a coroutine whose routine is an `async` body.
    pub fn run_async<T, F, Fut>(&self, body: F) -> CoroutineHandle<T>
    where
        T: Send + 'static,
        F: FnMut(Co<T>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.spawn(Coroutine::from_async(body))
    }

    /// Registers one coroutine per factory, in order.
    pub fn run_all<T, F, R, I>(&self, factories: I) -> Vec<CoroutineHandle<T>>
    where
        T: Send + 'static,
        F: FnMut() -> R + Send + 'static,
        R: Routine<T> + 'static,
        I: IntoIterator<Item = F>,
    {
        factories
            .into_iter()
            .map(|factory| self.run(factory))
            .collect()
    }

    /// Registers an already built coroutine.
    pub fn spawn<T>(&self, coroutine: Coroutine<T>) -> CoroutineHandle<T>
    where
        T: Send + 'static,
    {
        let handle = CoroutineHandle::new(coroutine);
        debug!(scheduler = %self.name, coroutine = %handle.id(), "coroutine registered");

        self.pool.add(handle.clone());
        handle
    }

    /// Ticks every registered coroutine once.
    ///
    /// Finished coroutines are removed during the same call. Returns
    /// `true` if any coroutine remains.
    ///
    /// # Panics
    ///
    /// Panics if called from inside a tick of this scheduler.
    #[track_caller]
    pub fn update(&self) -> bool {
        self.pool.assert_outside_pass("Scheduler::update");

        let span = trace_span!("scheduler.update", name = %self.name, members = self.pool.len());
        let _enter = span.enter();

        self.pool.update()
    }

    /// Drives every registered coroutine to completion.
    ///
    /// This is a **blocking** call that spins on [`update`](Self::update).
    ///
    /// # Panics
    ///
    /// Panics if called from inside a coroutine tick.
    #[track_caller]
    pub fn wait_all(&self) {
        tick::assert_can_block("Scheduler::wait_all");

        while self.update() {}
    }

    /// Aggregate status of the registered coroutines.
    ///
    /// # Panics
    ///
    /// Panics if called from inside a tick of this scheduler.
    #[track_caller]
    pub fn status(&self) -> Status {
        self.pool.assert_outside_pass("Scheduler::status");
        self.pool.status()
    }

    /// Cancels every registered coroutine.
    ///
    /// They are removed by the next [`update`](Self::update). A routine of
    /// this scheduler may call this; the request is applied once the
    /// current update has ticked every coroutine.
    pub fn cancel(&self) {
        debug!(scheduler = %self.name, "canceling all coroutines");
        self.pool.cancel();
    }

    /// Cancels and disposes every registered coroutine.
    ///
    /// # Panics
    ///
    /// Panics if called from inside a tick of this scheduler.
    #[track_caller]
    pub fn dispose(&self) {
        self.pool.assert_outside_pass("Scheduler::dispose");
        self.pool.dispose();
    }

    /// Number of registered coroutines.
    ///
    /// # Panics
    ///
    /// Panics if called from inside a tick of this scheduler.
    #[track_caller]
    pub fn len(&self) -> usize {
        self.pool.assert_outside_pass("Scheduler::len");
        self.pool.len()
    }

    /// Returns `true` if no coroutine is registered.
    #[track_caller]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("name", &self.name)
            .field("pool", &self.pool)
            .finish()
    }
}
