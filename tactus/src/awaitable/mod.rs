//! Suspension sources a routine can wait on.
//!
//! An [`Awaitable`] has a small start/poll lifecycle driven by the
//! coroutine that owns it:
//!
//! - [`Delay`] — completes once a duration has elapsed,
//! - [`Background`] — completes once a host operation has finished,
//! - [`Join`](crate::coroutine::Join) — completes once a child coroutine
//!   has finished.
//!
//! Awaitables that produce a value implement [`Resolve`] and deliver it
//! through a [`ResultCell`].

mod background;
mod cell;
mod delay;
mod promise;

#[doc(inline)]
pub use background::{Background, FutureOperation, Operation, Ready, ThreadOperation};

#[doc(inline)]
pub use cell::ResultCell;

#[doc(inline)]
pub use delay::{Delay, delay};

#[doc(inline)]
pub use promise::{Completer, Promise, promise};

use crate::error::Result;
use crate::status::AwaiterStatus;

/// A unit of work a coroutine can suspend on.
///
/// The owning coroutine calls [`start`](Awaitable::start) once when the
/// awaitable is attached and then [`poll`](Awaitable::poll) on every tick
/// until it stops being pending. An awaitable is owned exclusively by the
/// coroutine that started it.
pub trait Awaitable: Send {
    /// Current lifecycle stage.
    fn status(&self) -> AwaiterStatus;

    /// Moves the awaitable from `WaitingToRun` to `Running`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`](crate::Error::InvalidState) when the
    /// awaitable was already started.
    fn start(&mut self) -> Result<()>;

    /// Returns `true` while the awaitable is still pending.
    ///
    /// Reaching a non-pending state moves the status to `RanToCompletion`
    /// for good. An awaitable that was never started stays pending.
    fn poll(&mut self) -> bool;

    /// Releases resources held by the awaitable.
    ///
    /// Called when the awaitable is superseded by another child or when its
    /// owner is disposed.
    fn dispose(&mut self) {}
}

/// An awaitable that produces a value when it completes.
pub trait Resolve: Awaitable {
    /// The value delivered on completion.
    type Output: Send + 'static;

    /// Routes the value to `cell` once the awaitable completes.
    ///
    /// If the awaitable has already completed the value is delivered
    /// immediately.
    fn bind(&mut self, cell: ResultCell<Self::Output>);

    /// Binds a fresh cell and returns it alongside the awaitable.
    fn resolve(mut self) -> (Self, ResultCell<Self::Output>)
    where
        Self: Sized,
    {
        let cell = ResultCell::new();
        self.bind(cell.clone());
        (self, cell)
    }
}

impl<A: Awaitable + ?Sized> Awaitable for Box<A> {
    fn status(&self) -> AwaiterStatus {
        (**self).status()
    }

    fn start(&mut self) -> Result<()> {
        (**self).start()
    }

    fn poll(&mut self) -> bool {
        (**self).poll()
    }

    fn dispose(&mut self) {
        (**self).dispose()
    }
}
