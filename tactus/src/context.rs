use crate::utils::lock;

use std::cell::Cell;
use std::sync::Mutex;
use std::thread::{self, ThreadId};

thread_local! {
    /// Number of coroutine ticks currently on this thread's stack.
    ///
    /// Nested children are ticked from inside their parent's tick, so the
    /// depth can exceed one.
    static TICK_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Marks the current thread as executing a coroutine tick.
///
/// The depth is restored on drop, including when a routine body panics
/// and unwinds through the tick.
pub(crate) struct TickGuard(());

impl TickGuard {
    pub(crate) fn enter() -> Self {
        TICK_DEPTH.with(|depth| depth.set(depth.get() + 1));
        TickGuard(())
    }
}

impl Drop for TickGuard {
    fn drop(&mut self) {
        TICK_DEPTH.with(|depth| depth.set(depth.get() - 1));
    }
}

/// Returns `true` while a coroutine tick is executing on this thread.
pub fn in_tick() -> bool {
    TICK_DEPTH.with(|depth| depth.get() > 0)
}

/// Guards the blocking helpers (`wait`, `wait_all`, `get_result`).
///
/// Blocking from inside a tick would spin forever on work the current
/// tick is itself holding up.
///
/// # Panics
///
/// Panics if called while a coroutine tick is executing on this thread.
#[track_caller]
pub(crate) fn assert_can_block(operation: &str) {
    assert!(
        !in_tick(),
        "`{operation}` blocks until completion and must not be called from inside a coroutine tick"
    );
}

/// Records which thread is currently driving a pool or a shared coroutine.
///
/// Both hold a lock for the whole of their tick. Code running inside that
/// tick must check [`is_current`](Driver::is_current) before touching the
/// same structure, or it would wait on a lock its own thread holds.
#[derive(Debug, Default)]
pub(crate) struct Driver {
    thread: Mutex<Option<ThreadId>>,
}

impl Driver {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Marks the calling thread as the driver until the guard is dropped.
    pub(crate) fn enter(&self) -> DriverGuard<'_> {
        *lock(&self.thread) = Some(thread::current().id());
        DriverGuard { driver: self }
    }

    /// Returns `true` if the calling thread is driving right now.
    pub(crate) fn is_current(&self) -> bool {
        *lock(&self.thread) == Some(thread::current().id())
    }

    /// Panics if the calling thread is driving right now.
    #[track_caller]
    pub(crate) fn assert_not_current(&self, operation: &str) {
        assert!(
            !self.is_current(),
            "`{operation}` cannot be called from inside a tick of the pool or coroutine it targets"
        );
    }
}

/// Clears the driver on drop, including during a panic.
pub(crate) struct DriverGuard<'a> {
    driver: &'a Driver,
}

impl Drop for DriverGuard<'_> {
    fn drop(&mut self) {
        *lock(&self.driver.thread) = None;
    }
}
