use super::{Awaitable, Resolve, ResultCell};
use crate::error::{Error, Result};
use crate::status::AwaiterStatus;

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, Waker};
use std::thread::{self, JoinHandle};

use tracing::{debug, trace};

/// A host operation running outside the coroutine graph.
///
/// The engine only needs to know whether the operation has finished and
/// what it produced; how the work is carried out is up to the
/// implementation.
pub trait Operation: Send {
    /// The value produced on completion.
    type Output: Send + 'static;

    /// Returns the output once the operation has finished.
    ///
    /// Called once per tick while the operation is pending and never again
    /// after it has returned `Some`.
    fn poll_output(&mut self) -> Option<Self::Output>;
}

type Factory<O> = Box<dyn FnOnce() -> O + Send>;

/// Awaitable wrapping a background [`Operation`].
///
/// The operation is created by a factory when the awaitable is started,
/// so nothing runs until the owning routine actually waits on it.
pub struct Background<O: Operation> {
    factory: Option<Factory<O>>,

    operation: Option<O>,

    /// Receives the output on completion, if bound.
    sink: Option<ResultCell<O::Output>>,

    status: AwaiterStatus,
}

impl<O: Operation + 'static> Background<O> {
    /// Wraps a factory that creates the operation on start.
    pub fn new<F>(factory: F) -> Self
    where
        F: FnOnce() -> O + Send + 'static,
    {
        Self {
            factory: Some(Box::new(factory)),
            operation: None,
            sink: None,
            status: AwaiterStatus::WaitingToRun,
        }
    }

    /// Wraps an operation that already exists, such as a [`Promise`](super::Promise).
    pub fn from_operation(operation: O) -> Self {
        Self::new(move || operation)
    }
}

impl<T: Send + 'static> Background<FutureOperation<T>> {
    /// Runs the future returned by `factory`, polling it once per tick.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let greeting = co
    ///     .wait_for(Background::future(|| async { "Hello, world!".to_string() }))
    ///     .await;
    /// ```
    pub fn future<F, Fut>(factory: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        Self::new(move || FutureOperation::new(factory()))
    }
}

impl<T: Send + 'static> Background<ThreadOperation<T>> {
    /// Runs `work` on a dedicated thread.
    ///
    /// The output is `Err(Error::OperationPanicked)` if the thread panics.
    pub fn thread<F>(work: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        Self::new(move || ThreadOperation::spawn(work))
    }
}

impl<T: Send + 'static> Background<Ready<T>> {
    /// An operation that has already produced `value`.
    pub fn ready(value: T) -> Self {
        Self::from_operation(Ready(Some(value)))
    }
}

impl<O: Operation> Awaitable for Background<O> {
    fn status(&self) -> AwaiterStatus {
        self.status
    }

    fn start(&mut self) -> Result<()> {
        if self.status != AwaiterStatus::WaitingToRun {
            return Err(Error::InvalidState(self.status));
        }

        self.operation = self.factory.take().map(|factory| factory());
        self.status = AwaiterStatus::Running;
        debug!("background operation started");
        Ok(())
    }

    fn poll(&mut self) -> bool {
        if self.status != AwaiterStatus::Running {
            return self.status == AwaiterStatus::WaitingToRun;
        }

        let Some(operation) = self.operation.as_mut() else {
            self.status = AwaiterStatus::RanToCompletion;
            return false;
        };

        match operation.poll_output() {
            Some(output) => {
                if let Some(sink) = self.sink.take() {
                    sink.set(output);
                }

                self.operation = None;
                self.status = AwaiterStatus::RanToCompletion;
                debug!("background operation completed");
                false
            }
            None => {
                trace!("background operation pending");
                true
            }
        }
    }

    fn dispose(&mut self) {
        self.factory = None;
        self.operation = None;
    }
}

impl<O: Operation> Resolve for Background<O> {
    type Output = O::Output;

    fn bind(&mut self, cell: ResultCell<O::Output>) {
        self.sink = Some(cell);
    }
}

impl<O: Operation> fmt::Debug for Background<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Background")
            .field("status", &self.status)
            .field("bound", &self.sink.is_some())
            .finish()
    }
}

/// Operation driving a [`Future`] with a no-op waker.
///
/// The future is polled once per tick, which suits futures that make
/// progress on their own (channels, shared state, other threads) rather
/// than ones relying on a reactor to wake them.
pub struct FutureOperation<T> {
    future: Pin<Box<dyn Future<Output = T> + Send>>,
}

impl<T> FutureOperation<T> {
    /// Wraps `future`.
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Self {
            future: Box::pin(future),
        }
    }
}

impl<T: Send + 'static> Operation for FutureOperation<T> {
    type Output = T;

    fn poll_output(&mut self) -> Option<T> {
        let mut cx = Context::from_waker(Waker::noop());

        match self.future.as_mut().poll(&mut cx) {
            Poll::Ready(output) => Some(output),
            Poll::Pending => None,
        }
    }
}

/// Operation running a closure on its own thread.
pub struct ThreadOperation<T> {
    handle: Option<JoinHandle<T>>,
}

impl<T: Send + 'static> ThreadOperation<T> {
    /// Spawns `work` on a new thread.
    pub fn spawn<F>(work: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        Self {
            handle: Some(thread::spawn(work)),
        }
    }
}

impl<T: Send + 'static> Operation for ThreadOperation<T> {
    type Output = Result<T>;

    fn poll_output(&mut self) -> Option<Result<T>> {
        if !self.handle.as_ref()?.is_finished() {
            return None;
        }

        let handle = self.handle.take()?;
        Some(handle.join().map_err(|payload| Error::OperationPanicked(panic_message(payload))))
    }
}

/// Operation whose output is available immediately.
pub struct Ready<T>(Option<T>);

impl<T: Send + 'static> Operation for Ready<T> {
    type Output = T;

    fn poll_output(&mut self) -> Option<T> {
        self.0.take()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }

    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(_) => "unknown panic payload".to_string(),
    }
}
