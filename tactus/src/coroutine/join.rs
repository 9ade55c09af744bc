use super::{Coroutine, CoroutineHandle};
use crate::awaitable::{Awaitable, Resolve, ResultCell};
use crate::error::{Error, Result};
use crate::status::{AwaiterStatus, Status};

use std::fmt;

use tracing::trace;

/// The coroutine a [`Join`] waits on.
enum Child<T> {
    Owned(Box<Coroutine<T>>),
    Shared(CoroutineHandle<T>),
}

impl<T: Send + 'static> Child<T> {
    fn update(&mut self) -> bool {
        match self {
            Child::Owned(coroutine) => coroutine.update(),
            Child::Shared(handle) if handle.is_enlisted() => !handle.is_finished(),
            Child::Shared(handle) => handle.update(),
        }
    }

    fn status(&self) -> Status {
        match self {
            Child::Owned(coroutine) => coroutine.status(),
            Child::Shared(handle) => handle.status(),
        }
    }

    fn take_result(&mut self) -> Option<T> {
        match self {
            Child::Owned(coroutine) => coroutine.take_result(),
            Child::Shared(handle) => handle.take_result(),
        }
    }

    fn dispose(&mut self) {
        match self {
            Child::Owned(coroutine) => coroutine.dispose(),
            Child::Shared(handle) if handle.is_enlisted() => {}
            Child::Shared(handle) => handle.dispose(),
        }
    }
}

/// Awaitable that drives a child coroutine until it finishes.
///
/// Each poll runs one [`update`](Coroutine::update) of the child, so the
/// child advances exactly once per tick of its parent. A shared child that
/// a pool or scheduler already drives is only watched: it keeps a single
/// tick per update of that pool, and disposing the join leaves it to the
/// pool. The parent is released when the child completes or is cancelled;
/// a bound [`ResultCell`] receives the child's result, if it produced one.
///
/// A child that has already finished when the join is created is
/// reported as completed straight away and is never started.
pub struct Join<T> {
    child: Child<T>,

    /// Receives the child's result on completion, if bound.
    sink: Option<ResultCell<T>>,

    status: AwaiterStatus,
}

impl<T: Send + 'static> Join<T> {
    fn with_child(child: Child<T>) -> Self {
        let status = AwaiterStatus::from(child.status());

        Self {
            child,
            sink: None,
            status,
        }
    }

    /// Moves the child's result into the bound cell, if any.
    fn forward(&mut self) {
        let Some(sink) = self.sink.take() else {
            return;
        };

        if let Some(value) = self.child.take_result() {
            sink.set(value);
        }
    }
}

impl<T: Send + 'static> From<Coroutine<T>> for Join<T> {
    fn from(coroutine: Coroutine<T>) -> Self {
        Self::with_child(Child::Owned(Box::new(coroutine)))
    }
}

impl<T: Send + 'static> From<CoroutineHandle<T>> for Join<T> {
    fn from(handle: CoroutineHandle<T>) -> Self {
        Self::with_child(Child::Shared(handle))
    }
}

impl<T: Send + 'static> Awaitable for Join<T> {
    fn status(&self) -> AwaiterStatus {
        self.status
    }

    fn start(&mut self) -> Result<()> {
        if self.status != AwaiterStatus::WaitingToRun {
            return Err(Error::InvalidState(self.status));
        }

        self.status = AwaiterStatus::Running;
        Ok(())
    }

    fn poll(&mut self) -> bool {
        match self.status {
            AwaiterStatus::WaitingToRun => true,
            AwaiterStatus::RanToCompletion => false,
            AwaiterStatus::Running => {
                if self.child.update() {
                    return true;
                }

                trace!(child = ?self.child.status(), "joined coroutine finished");
                self.status = AwaiterStatus::RanToCompletion;
                self.forward();
                false
            }
        }
    }

    fn dispose(&mut self) {
        self.sink = None;
        self.child.dispose();
    }
}

impl<T: Send + 'static> Resolve for Join<T> {
    type Output = T;

    fn bind(&mut self, cell: ResultCell<T>) {
        self.sink = Some(cell);

        if self.status == AwaiterStatus::RanToCompletion {
            self.forward();
        }
    }
}

impl<T> fmt::Debug for Join<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Join")
            .field("status", &self.status)
            .field("bound", &self.sink.is_some())
            .finish()
    }
}
