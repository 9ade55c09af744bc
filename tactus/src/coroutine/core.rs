use super::{Cooperative, CoroutineId};
use crate::awaitable::Awaitable;
use crate::context::{self, TickGuard};
use crate::routine::{AsyncRoutine, Co, Command, Routine};
use crate::status::{AwaiterStatus, Status};

use std::fmt;
use std::future::Future;

use tracing::{debug, trace};

type Factory<T> = Box<dyn FnMut() -> Box<dyn Routine<T>> + Send>;

/// Drives one routine tick by tick.
///
/// A `Coroutine` starts in [`Status::WaitingToRun`]. Its first
/// [`update`](Self::update) builds the routine from the factory and moves
/// it to [`Status::Running`]; every later update resumes the routine by one
/// step, unless the coroutine is suspended on a pending child. The
/// coroutine finishes when the routine is exhausted, when it yields
/// [`Command::Result`], or when it is cancelled.
///
/// Dropping a coroutine disposes it.
///
/// # Examples
///
/// ```rust,ignore
/// let mut coroutine = Coroutine::from_async(|co: Co<&str>| async move {
///     co.yield_now().await;
///     co.finish("done").await;
/// });
///
/// while coroutine.update() {
///     // one frame of the host loop
/// }
///
/// assert_eq!(coroutine.take_result(), Some("done"));
/// ```
pub struct Coroutine<T> {
    id: CoroutineId,

    /// Builds a fresh routine; called on first tick and on every reset.
    factory: Factory<T>,

    /// The materialized routine, if any.
    routine: Option<Box<dyn Routine<T>>>,

    /// The child this coroutine is suspended on, if any.
    child: Option<Box<dyn Awaitable>>,

    result: Option<T>,

    status: Status,
}

impl<T: Send + 'static> Coroutine<T> {
    /// Creates a coroutine from a routine factory.
    ///
    /// The factory is not called until the first tick, and is called again
    /// every time the routine yields [`Command::Reset`].
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let coroutine = Coroutine::new(|| vec![Command::Yield, Command::Result(5)].into_iter());
    /// ```
    pub fn new<F, R>(mut factory: F) -> Self
    where
        F: FnMut() -> R + Send + 'static,
        R: Routine<T> + 'static,
    {
        Self {
            id: CoroutineId::next(),
            factory: Box::new(move || Box::new(factory()) as Box<dyn Routine<T>>),
            routine: None,
            child: None,
            result: None,
            status: Status::WaitingToRun,
        }
    }

    /// Creates a coroutine whose routine is an `async` body.
    ///
    /// `body` receives a [`Co`] handle and is called again on every reset.
    pub fn from_async<F, Fut>(mut body: F) -> Self
    where
        F: FnMut(Co<T>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self::new(move || AsyncRoutine::new(&mut body))
    }

    /// Advances the coroutine by one tick.
    ///
    /// Returns `true` while the coroutine is still in progress. Once it
    /// has completed or been cancelled every call returns `false` without
    /// doing anything.
    ///
    /// # Panics
    ///
    /// Panics if the routine body panics; the panic propagates out of this
    /// call. Also panics if the routine awaits something that reports
    /// [`AwaiterStatus::WaitingToRun`] but then refuses to
    /// [`start`](crate::Awaitable::start).
    pub fn update(&mut self) -> bool {
        if self.status.is_terminal() {
            return false;
        }

        let _tick = TickGuard::enter();

        if let Some(child) = self.child.as_mut() {
            if child.status() != AwaiterStatus::RanToCompletion && child.poll() {
                trace!(coroutine = %self.id, "suspended on child");
                return true;
            }
        }

        if self.routine.is_none() {
            self.routine = Some((self.factory)());
            self.status = Status::Running;
            debug!(coroutine = %self.id, "routine materialized");
        }

        let command = self.routine.as_mut().and_then(|routine| routine.resume());

        match command {
            None => {
                self.status = Status::RanToCompletion;
                debug!(coroutine = %self.id, "routine exhausted");
            }
            Some(Command::Yield) => {
                trace!(coroutine = %self.id, "yielded");
            }
            Some(Command::Await(child)) => self.attach(child),
            Some(Command::Reset) => {
                drop(self.routine.take());
                self.routine = Some((self.factory)());
                debug!(coroutine = %self.id, "routine restarted");
            }
            Some(Command::Result(value)) => {
                self.result = Some(value);
                self.status = Status::RanToCompletion;
                debug!(coroutine = %self.id, "completed with a result");
            }
        }

        !self.status.is_terminal()
    }

    /// Replaces the current child with `child` and starts it.
    ///
    /// A child that has already completed is kept as satisfied without
    /// being started, so the next tick moves past it. A child that is
    /// already running is attached as it is.
    fn attach(&mut self, mut child: Box<dyn Awaitable>) {
        if let Some(mut previous) = self.child.take() {
            previous.dispose();
        }

        match child.status() {
            AwaiterStatus::WaitingToRun => {
                if let Err(error) = child.start() {
                    panic!("awaitable reported WaitingToRun but failed to start: {error}");
                }
                trace!(coroutine = %self.id, "child started");
            }
            AwaiterStatus::Running => {
                trace!(coroutine = %self.id, "child attached while already running");
            }
            AwaiterStatus::RanToCompletion => {
                trace!(coroutine = %self.id, "child already completed");
            }
        }

        self.child = Some(child);
    }

    /// Drives the coroutine to completion on the calling thread.
    ///
    /// This is a **blocking** call that spins on [`update`](Self::update)
    /// and should only be used outside of the host's tick loop, e.g. in
    /// tests or at shutdown.
    ///
    /// # Panics
    ///
    /// Panics if called from inside a coroutine tick.
    #[track_caller]
    pub fn wait(&mut self) {
        context::assert_can_block("Coroutine::wait");

        while self.update() {}
    }

    /// Drives the coroutine to completion and takes its result.
    ///
    /// Returns `None` if the routine never produced a result, was
    /// cancelled, or the result was already taken. This is a **blocking**
    /// call, see [`wait`](Self::wait).
    ///
    /// # Panics
    ///
    /// Panics if called from inside a coroutine tick.
    #[track_caller]
    pub fn get_result(&mut self) -> Option<T> {
        context::assert_can_block("Coroutine::get_result");

        while self.update() {}

        self.result.take()
    }
}

impl<T> Coroutine<T> {
    /// Identifier used in log fields.
    pub fn id(&self) -> CoroutineId {
        self.id
    }

    /// Current lifecycle stage.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Returns `true` once the coroutine has completed or been cancelled.
    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }

    /// The stored result, without blocking.
    pub fn result(&self) -> Option<&T> {
        self.result.as_ref()
    }

    /// Takes the stored result, without blocking.
    pub fn take_result(&mut self) -> Option<T> {
        self.result.take()
    }

    /// Cancels the coroutine.
    ///
    /// Has no effect once the coroutine has run to completion. Otherwise
    /// the status becomes [`Status::Canceled`] immediately, whatever the
    /// child is doing; nothing is torn down until [`dispose`](Self::dispose).
    pub fn cancel(&mut self) {
        if self.status.is_terminal() {
            return;
        }

        self.status = Status::Canceled;
        debug!(coroutine = %self.id, "canceled");
    }

    /// Cancels the coroutine if it has not finished and releases the
    /// routine and any attached child, disposing that child as well.
    pub fn dispose(&mut self) {
        self.cancel();

        if let Some(mut child) = self.child.take() {
            child.dispose();
        }

        if self.routine.take().is_some() {
            trace!(coroutine = %self.id, "disposed");
        }
    }
}

impl<T> Drop for Coroutine<T> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<T: Send + 'static> Cooperative for Coroutine<T> {
    fn update(&mut self) -> bool {
        Coroutine::update(self)
    }

    fn status(&self) -> Status {
        self.status
    }

    fn cancel(&mut self) {
        Coroutine::cancel(self)
    }

    fn dispose(&mut self) {
        Coroutine::dispose(self)
    }
}

impl<T> fmt::Debug for Coroutine<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coroutine")
            .field("id", &self.id)
            .field("status", &self.status)
            .field("child", &self.child.as_ref().map(|child| child.status()))
            .field("has_result", &self.result.is_some())
            .finish()
    }
}
