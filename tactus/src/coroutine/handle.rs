use super::{Cooperative, Coroutine, CoroutineId};
use crate::context::{self, Driver};
use crate::status::Status;
use crate::utils::lock;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::debug;

/// State shared by every clone of a handle.
struct Shared<T> {
    coroutine: Mutex<Coroutine<T>>,

    /// Thread currently inside [`CoroutineHandle::update`], if any.
    driver: Driver,

    /// Cancellation requested by the coroutine's own routine.
    cancel_requested: AtomicBool,

    /// Set once a pool or scheduler drives the coroutine.
    enlisted: AtomicBool,
}

/// A shared handle to a coroutine.
///
/// Schedulers keep one clone and return another to the caller, so the
/// caller can observe status, cancel or collect the result independently
/// of the scheduler's update cadence. Every operation locks the
/// coroutine for its duration.
///
/// The routine driven by a handle may use that same handle while it runs:
/// [`status`](Self::status) reports [`Status::Running`],
/// [`cancel`](Self::cancel) takes effect at the end of the tick and the
/// result accessors return `None`.
pub struct CoroutineHandle<T> {
    id: CoroutineId,
    inner: Arc<Shared<T>>,
}

impl<T: Send + 'static> CoroutineHandle<T> {
    /// Wraps `coroutine` in a shareable handle.
    pub fn new(coroutine: Coroutine<T>) -> Self {
        Self {
            id: coroutine.id(),
            inner: Arc::new(Shared {
                coroutine: Mutex::new(coroutine),
                driver: Driver::new(),
                cancel_requested: AtomicBool::new(false),
                enlisted: AtomicBool::new(false),
            }),
        }
    }

    /// Advances the coroutine by one tick, see [`Coroutine::update`].
    ///
    /// # Panics
    ///
    /// Panics if called by the coroutine's own routine, and whenever
    /// [`Coroutine::update`] panics.
    #[track_caller]
    pub fn update(&self) -> bool {
        self.inner.driver.assert_not_current("CoroutineHandle::update");

        let mut coroutine = lock(&self.inner.coroutine);
        let _driving = self.inner.driver.enter();

        let running = coroutine.update();

        if self.inner.cancel_requested.swap(false, Ordering::AcqRel) {
            coroutine.cancel();
            return false;
        }

        running
    }

    /// Drives the coroutine to completion on the calling thread.
    ///
    /// This is a **blocking** call, see [`Coroutine::wait`].
    ///
    /// # Panics
    ///
    /// Panics if called from inside a coroutine tick.
    #[track_caller]
    pub fn wait(&self) {
        context::assert_can_block("CoroutineHandle::wait");

        while self.update() {}
    }

    /// Drives the coroutine to completion and takes its result.
    ///
    /// This is a **blocking** call, see [`Coroutine::get_result`].
    ///
    /// # Panics
    ///
    /// Panics if called from inside a coroutine tick.
    #[track_caller]
    pub fn get_result(&self) -> Option<T> {
        context::assert_can_block("CoroutineHandle::get_result");

        while self.update() {}

        self.take_result()
    }
}

impl<T> CoroutineHandle<T> {
    /// Identifier of the underlying coroutine.
    pub fn id(&self) -> CoroutineId {
        self.id
    }

    /// Current lifecycle stage.
    pub fn status(&self) -> Status {
        if self.inner.driver.is_current() {
            return Status::Running;
        }

        lock(&self.inner.coroutine).status()
    }

    /// Returns `true` once the coroutine has completed or been cancelled.
    pub fn is_finished(&self) -> bool {
        self.status().is_terminal()
    }

    /// Takes the stored result without blocking.
    pub fn take_result(&self) -> Option<T> {
        if self.inner.driver.is_current() {
            return None;
        }

        lock(&self.inner.coroutine).take_result()
    }

    /// Cancels the coroutine, see [`Coroutine::cancel`].
    ///
    /// When called by the coroutine's own routine the cancellation is
    /// applied as soon as the current tick returns.
    pub fn cancel(&self) {
        if self.inner.driver.is_current() {
            debug!(coroutine = %self.id, "cancel requested from its own tick");
            self.inner.cancel_requested.store(true, Ordering::Release);
            return;
        }

        lock(&self.inner.coroutine).cancel()
    }

    /// Disposes the coroutine, see [`Coroutine::dispose`].
    ///
    /// # Panics
    ///
    /// Panics if called by the coroutine's own routine.
    #[track_caller]
    pub fn dispose(&self) {
        self.inner.driver.assert_not_current("CoroutineHandle::dispose");

        lock(&self.inner.coroutine).dispose()
    }

    /// Returns `true` once a pool or scheduler drives this coroutine.
    ///
    /// A [`Join`](super::Join) on an enlisted handle only watches the
    /// coroutine instead of ticking it a second time.
    pub fn is_enlisted(&self) -> bool {
        self.inner.enlisted.load(Ordering::Acquire)
    }
}

impl<T: Clone> CoroutineHandle<T> {
    /// A copy of the stored result, leaving it in place.
    pub fn result(&self) -> Option<T> {
        if self.inner.driver.is_current() {
            return None;
        }

        lock(&self.inner.coroutine).result().cloned()
    }
}

impl<T> Clone for CoroutineHandle<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            inner: self.inner.clone(),
        }
    }
}

impl<T: Send + 'static> From<Coroutine<T>> for CoroutineHandle<T> {
    fn from(coroutine: Coroutine<T>) -> Self {
        Self::new(coroutine)
    }
}

impl<T: Send + 'static> Cooperative for CoroutineHandle<T> {
    fn update(&mut self) -> bool {
        CoroutineHandle::update(self)
    }

    fn status(&self) -> Status {
        CoroutineHandle::status(self)
    }

    fn cancel(&mut self) {
        CoroutineHandle::cancel(self)
    }

    fn dispose(&mut self) {
        CoroutineHandle::dispose(self)
    }

    fn enlist(&mut self) {
        self.inner.enlisted.store(true, Ordering::Release);
    }
}

impl<T> fmt::Debug for CoroutineHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoroutineHandle")
            .field("id", &self.id)
            .field("status", &self.status())
            .field("enlisted", &self.is_enlisted())
            .finish()
    }
}
