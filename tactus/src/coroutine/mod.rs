//! The coroutine engine.
//!
//! A [`Coroutine`] drives one routine tick by tick. It materializes the
//! routine lazily, resumes it once per [`update`](Coroutine::update),
//! dispatches the [`Command`](crate::Command) it yields and suspends on at
//! most one child awaitable at a time.
//!
//! It includes:
//! - the [`Coroutine`] state machine,
//! - [`CoroutineHandle`], a shared handle used by schedulers,
//! - [`Join`], the awaitable a parent uses to wait on a child coroutine,
//! - the [`Cooperative`] trait pools use to tick heterogeneous members.

mod core;
mod handle;
mod id;
mod join;

pub use self::core::Coroutine;
pub use handle::CoroutineHandle;
pub use id::CoroutineId;
pub use join::Join;

use crate::status::Status;

/// Anything a [`Pool`](crate::Pool) can tick.
///
/// The trait hides the result type of a coroutine so that a pool can hold
/// members producing different values, and lets pools nest.
pub trait Cooperative: Send {
    /// Advances by one tick. Returns `true` while still in progress.
    fn update(&mut self) -> bool;

    /// Current lifecycle stage.
    fn status(&self) -> Status;

    /// Requests cancellation. Has no effect once completed.
    fn cancel(&mut self);

    /// Cancels if needed and releases every held resource.
    fn dispose(&mut self);

    /// Called once when a pool takes the member in.
    fn enlist(&mut self) {}
}
