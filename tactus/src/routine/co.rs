use super::{Command, Routine};
use crate::awaitable::{Awaitable, Resolve, ResultCell};
use crate::coroutine::Join;
use crate::utils::lock;

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};

/// Slot through which an async body hands its next command to the engine.
type Slot<T> = Arc<Mutex<Option<Command<T>>>>;

/// Handle given to an async routine body.
///
/// Each method suspends the body with exactly one [`Command`]. The
/// returned futures only make sense when awaited directly by the body
/// the handle was created for.
///
/// # Examples
///
/// ```rust,ignore
/// let coroutine = Coroutine::from_async(|co: Co<u32>| async move {
///     co.wait(delay(Duration::from_millis(100))).await;
///     co.finish(7).await;
/// });
/// ```
pub struct Co<T> {
    slot: Slot<T>,
}

impl<T: Send + 'static> Co<T> {
    /// Pauses the body until the next tick.
    pub async fn yield_now(&self) {
        self.suspend(Command::Yield).await
    }

    /// Pauses the body until `awaitable` has run to completion.
    pub async fn wait<A>(&self, awaitable: A)
    where
        A: Awaitable + 'static,
    {
        self.suspend(Command::wait(awaitable)).await
    }

    /// Pauses the body until `awaitable` completes and returns its value.
    ///
    /// Returns `None` when the awaitable finished without producing one,
    /// e.g. a joined child that was cancelled.
    pub async fn wait_for<A>(&self, awaitable: A) -> Option<A::Output>
    where
        A: Resolve + 'static,
    {
        let (awaitable, cell) = awaitable.resolve();
        self.wait(awaitable).await;
        cell.take()
    }

    /// Drives a child coroutine to completion and returns its result.
    pub async fn join<U>(&self, child: impl Into<Join<U>>) -> Option<U>
    where
        U: Send + 'static,
    {
        self.wait_for(child.into()).await
    }

    /// Restarts the routine from its first statement.
    ///
    /// The current body is dropped by the engine, so this never resumes.
    pub async fn restart(&self) {
        self.suspend(Command::Reset).await
    }

    /// Completes the coroutine with `value`.
    ///
    /// The body is never resumed afterwards; code following this call
    /// does not run.
    pub async fn finish(&self, value: T) {
        self.suspend(Command::Result(value)).await
    }

    fn suspend(&self, command: Command<T>) -> Suspend<T> {
        Suspend {
            slot: self.slot.clone(),
            command: Some(command),
        }
    }
}

/// A future that parks one command in the slot and yields exactly once.
struct Suspend<T> {
    slot: Slot<T>,
    command: Option<Command<T>>,
}

// No field is ever pinned.
impl<T> Unpin for Suspend<T> {}

impl<T> Future for Suspend<T> {
    type Output = ();

    /// On the first poll the command is stored and the body suspends.
    /// The second poll happens on a later tick and completes.
    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        match this.command.take() {
            Some(command) => {
                *lock(&this.slot) = Some(command);
                Poll::Pending
            }
            None => Poll::Ready(()),
        }
    }
}

/// A [`Routine`] backed by an `async` body.
///
/// Each [`resume`](Routine::resume) polls the body once with a no-op
/// waker. When the body suspends without going through its [`Co`]
/// handle (for instance while awaiting some unrelated future that is not
/// ready yet) the suspension is treated as [`Command::Yield`], so that
/// future is polled again on the next tick.
pub struct AsyncRoutine<T> {
    slot: Slot<T>,
    body: Pin<Box<dyn Future<Output = ()> + Send>>,
}

impl<T: Send + 'static> AsyncRoutine<T> {
    /// Creates a fresh body by calling `body` with a new [`Co`] handle.
    ///
    /// The body does not run until it is first resumed.
    pub fn new<F, Fut>(body: &mut F) -> Self
    where
        F: FnMut(Co<T>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let slot: Slot<T> = Arc::new(Mutex::new(None));
        let co = Co { slot: slot.clone() };

        Self {
            slot,
            body: Box::pin(body(co)),
        }
    }
}

impl<T: Send + 'static> Routine<T> for AsyncRoutine<T> {
    fn resume(&mut self) -> Option<Command<T>> {
        let mut cx = Context::from_waker(Waker::noop());

        match self.body.as_mut().poll(&mut cx) {
            Poll::Ready(()) => None,
            Poll::Pending => Some(lock(&self.slot).take().unwrap_or(Command::Yield)),
        }
    }
}
