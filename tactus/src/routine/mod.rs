//! Routine authoring surface.
//!
//! A routine is the user-written body a [`Coroutine`](crate::Coroutine)
//! drives. Every time it suspends it hands the engine exactly one
//! [`Command`] from a closed vocabulary:
//!
//! - [`Command::Yield`] — pause until the next tick,
//! - [`Command::Await`] — pause until a child awaitable finishes,
//! - [`Command::Reset`] — restart the routine from its first statement,
//! - [`Command::Result`] — complete with a value.
//!
//! Routines can be written in two styles:
//!
//! - any [`Iterator`] over commands (see [`Routine`]),
//! - an `async` body driven through a [`Co`] handle (see
//!   [`Coroutine::from_async`](crate::Coroutine::from_async)).

mod co;

pub use co::{AsyncRoutine, Co};

use crate::awaitable::{Awaitable, Resolve, ResultCell};
use crate::coroutine::Join;

use std::fmt;

/// An instruction yielded by a routine to its coroutine.
pub enum Command<T> {
    /// Suspend until the next tick.
    Yield,

    /// Suspend until the child stops being pending.
    ///
    /// The child replaces (and disposes) any child attached earlier.
    Await(Box<dyn Awaitable>),

    /// Discard the routine instance and build a fresh one from the factory.
    ///
    /// Only routine-local progress is lost; state captured outside the
    /// routine persists across the restart.
    Reset,

    /// Store the value and complete the coroutine immediately.
    Result(T),
}

impl<T> Command<T> {
    /// Builds an [`Command::Await`] for `awaitable`.
    pub fn wait<A>(awaitable: A) -> Self
    where
        A: Awaitable + 'static,
    {
        Command::Await(Box::new(awaitable))
    }

    /// Builds an [`Command::Await`] together with the cell the awaitable's
    /// value is written to once it completes.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let (command, greeting) = Command::wait_for(Background::ready("hello"));
    /// // yield `command`, then on the next step:
    /// assert_eq!(greeting.take(), Some("hello"));
    /// ```
    pub fn wait_for<A>(awaitable: A) -> (Self, ResultCell<A::Output>)
    where
        A: Resolve + 'static,
    {
        let (awaitable, cell) = awaitable.resolve();
        (Command::wait(awaitable), cell)
    }

    /// Awaits a child coroutine and returns the cell receiving its result.
    pub fn join<U>(child: impl Into<Join<U>>) -> (Self, ResultCell<U>)
    where
        U: Send + 'static,
    {
        Command::wait_for(child.into())
    }
}

impl<T: fmt::Debug> fmt::Debug for Command<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Yield => f.write_str("Yield"),
            Command::Await(child) => f
                .debug_struct("Await")
                .field("status", &child.status())
                .finish(),
            Command::Reset => f.write_str("Reset"),
            Command::Result(value) => f.debug_tuple("Result").field(value).finish(),
        }
    }
}

/// A resumable sequence of commands.
///
/// [`resume`](Routine::resume) advances the body to its next suspension
/// point and returns the command it suspended with, or `None` once the
/// body is exhausted. A routine is never resumed again after returning
/// `None` or a [`Command::Result`].
///
/// Every `Iterator<Item = Command<T>>` is a routine, so simple bodies can
/// be written with iterator adapters or [`std::iter::from_fn`].
pub trait Routine<T>: Send {
    /// Runs the body up to its next suspension point.
    fn resume(&mut self) -> Option<Command<T>>;
}

impl<T, I> Routine<T> for I
where
    I: Iterator<Item = Command<T>> + Send,
{
    fn resume(&mut self) -> Option<Command<T>> {
        self.next()
    }
}
