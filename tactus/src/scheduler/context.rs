use super::Scheduler;
use crate::coroutine::{Coroutine, CoroutineHandle};
use crate::routine::{Co, Routine};
use crate::status::Status;
use crate::utils::lock;

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::debug;

/// A mutable value shared by every routine of a [`ContextScheduler`].
///
/// Routines run one after another within a tick, so a routine ticked later
/// in the same [`update`](ContextScheduler::update) observes whatever an
/// earlier routine left in the context.
///
/// The context also carries a cancel request: calling
/// [`cancel`](Self::cancel) from a routine or from the host makes the
/// scheduler cancel all of its coroutines at the start of its next update.
pub struct SharedContext<C> {
    value: Arc<Mutex<C>>,
    cancel: Arc<AtomicBool>,
}

impl<C> SharedContext<C> {
    /// Wraps `value` in a new shared context.
    pub fn new(value: C) -> Self {
        Self {
            value: Arc::new(Mutex::new(value)),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Runs `f` with exclusive access to the value.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// ctx.with(|score| *score += 10);
    /// ```
    pub fn with<R>(&self, f: impl FnOnce(&mut C) -> R) -> R {
        f(&mut lock(&self.value))
    }

    /// Replaces the value.
    pub fn set(&self, value: C) {
        *lock(&self.value) = value;
    }

    /// Replaces the value, returning the previous one.
    pub fn replace(&self, value: C) -> C {
        std::mem::replace(&mut *lock(&self.value), value)
    }

    /// Requests that every coroutine of the scheduler be cancelled.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Release);
    }

    /// Returns `true` if a cancel request is pending.
    pub fn is_cancel_requested(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }

    /// Clears a pending cancel request, returning whether there was one.
    fn take_cancel_request(&self) -> bool {
        self.cancel.swap(false, Ordering::AcqRel)
    }
}

impl<C: Clone> SharedContext<C> {
    /// A copy of the current value.
    pub fn get(&self) -> C {
        lock(&self.value).clone()
    }
}

impl<C> Clone for SharedContext<C> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            cancel: self.cancel.clone(),
        }
    }
}

impl<C: fmt::Debug> fmt::Debug for SharedContext<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedContext")
            .field("value", &*lock(&self.value))
            .field("cancel_requested", &self.is_cancel_requested())
            .finish()
    }
}

/// A [`Scheduler`] whose routine factories receive a [`SharedContext`].
///
/// # Examples
///
/// ```rust,ignore
/// let scheduler = SchedulerBuilder::new().build_with_context(0u32);
///
/// scheduler.run_async(|co: Co<()>, ctx| async move {
///     ctx.with(|hits| *hits += 1);
///     co.yield_now().await;
/// });
///
/// scheduler.wait_all();
/// assert_eq!(scheduler.context().get(), 1);
/// ```
pub struct ContextScheduler<C> {
    scheduler: Scheduler,
    context: SharedContext<C>,
}

impl<C: Send + 'static> ContextScheduler<C> {
    /// Creates a scheduler with the default configuration sharing `value`.
    pub fn new(value: C) -> Self {
        Self::with_scheduler(Scheduler::new(), value)
    }

    pub(crate) fn with_scheduler(scheduler: Scheduler, value: C) -> Self {
        Self {
            scheduler,
            context: SharedContext::new(value),
        }
    }

    /// The context handed to every routine.
    pub fn context(&self) -> &SharedContext<C> {
        &self.context
    }

    /// Name attached to this scheduler's tracing spans.
    pub fn name(&self) -> &str {
        self.scheduler.name()
    }

    /// Registers a coroutine whose factory receives the shared context.
    ///
    /// The factory is called again with the context on every reset.
    pub fn run<T, F, R>(&self, mut factory: F) -> CoroutineHandle<T>
    where
        T: Send + 'static,
        F: FnMut(SharedContext<C>) -> R + Send + 'static,
        R: Routine<T> + 'static,
    {
        let context = self.context.clone();
        self.scheduler.run(move || factory(context.clone()))
    }

    /// Registers an `async` body that receives the shared context.
    pub fn run_async<T, F, Fut>(&self, mut body: F) -> CoroutineHandle<T>
    where
        T: Send + 'static,
        F: FnMut(Co<T>, SharedContext<C>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let context = self.context.clone();
        self.scheduler.run_async(move |co| body(co, context.clone()))
    }

    /// Registers an already built coroutine.
    pub fn spawn<T>(&self, coroutine: Coroutine<T>) -> CoroutineHandle<T>
    where
        T: Send + 'static,
    {
        self.scheduler.spawn(coroutine)
    }

    /// Ticks every registered coroutine once.
    ///
    /// A cancel request pending on the context is honored and cleared
    /// first, so every coroutine is cancelled and removed by this call.
    ///
    /// # Panics
    ///
    /// Panics if called from inside a tick of this scheduler.
    #[track_caller]
    pub fn update(&self) -> bool {
        if self.context.take_cancel_request() {
            debug!(scheduler = %self.scheduler.name(), "context requested cancellation");
            self.scheduler.cancel();
        }

        self.scheduler.update()
    }

    /// Drives every registered coroutine to completion.
    ///
    /// This is a **blocking** call, see [`Scheduler::wait_all`].
    ///
    /// # Panics
    ///
    /// Panics if called from inside a coroutine tick.
    #[track_caller]
    pub fn wait_all(&self) {
        crate::context::assert_can_block("ContextScheduler::wait_all");

        while self.update() {}
    }

    /// Aggregate status of the registered coroutines.
    #[track_caller]
    pub fn status(&self) -> Status {
        self.scheduler.status()
    }

    /// Cancels every registered coroutine.
    pub fn cancel(&self) {
        self.scheduler.cancel();
    }

    /// Cancels and disposes every registered coroutine.
    #[track_caller]
    pub fn dispose(&self) {
        self.scheduler.dispose();
    }

    /// Number of registered coroutines.
    #[track_caller]
    pub fn len(&self) -> usize {
        self.scheduler.len()
    }

    /// Returns `true` if no coroutine is registered.
    #[track_caller]
    pub fn is_empty(&self) -> bool {
        self.scheduler.is_empty()
    }
}

impl<C: Default + Send + 'static> Default for ContextScheduler<C> {
    fn default() -> Self {
        Self::new(C::default())
    }
}

impl<C: fmt::Debug> fmt::Debug for ContextScheduler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextScheduler")
            .field("scheduler", &self.scheduler)
            .field("context", &self.context)
            .finish()
    }
}
