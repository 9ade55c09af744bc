use crate::context::{self, Driver};
use crate::coroutine::Cooperative;
use crate::status::Status;
use crate::utils::lock;

use std::fmt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, trace};

type Member = Box<dyn Cooperative>;

/// An unordered collection of coroutines ticked as one unit.
///
/// `Pool` is especially useful when a host wants to:
/// - advance a dynamic set of coroutines once per frame,
/// - observe their aggregate progress through a single [`Status`],
/// - cancel or tear down the whole set at once.
///
/// Members are removed automatically by the [`update`](Self::update) that
/// sees them finish. All operations take `&self` and serialize access to
/// the member set internally, so a pool can be shared between threads;
/// still, only one `update` should be in flight at a time.
///
/// A routine ticked by a pool may call [`add`](Self::add) and
/// [`cancel`](Self::cancel) on that same pool; a cancel is applied once the
/// current pass is over. Every other operation panics when called from
/// inside the pool's own pass.
///
/// A pool is itself [`Cooperative`] and can be added to another pool.
pub struct Pool {
    /// Members ticked by [`update`](Self::update).
    members: Mutex<Vec<Member>>,

    /// Members added since the last update started.
    ///
    /// Kept apart so that a routine can add to the pool that is ticking it.
    incoming: Mutex<Vec<Member>>,

    /// Thread currently inside [`update`](Self::update), if any.
    driver: Driver,

    /// Cancellation requested from inside the current pass.
    cancel_requested: AtomicBool,
}

impl Pool {
    /// Creates a new, empty `Pool`.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty pool with room for `capacity` members.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            members: Mutex::new(Vec::with_capacity(capacity)),
            incoming: Mutex::new(Vec::new()),
            driver: Driver::new(),
            cancel_requested: AtomicBool::new(false),
        }
    }

    /// Adds a member to the pool.
    ///
    /// The member is ticked from the next [`update`](Self::update) on, even
    /// when it is added from inside a tick of this same pool.
    pub fn add<C>(&self, member: C)
    where
        C: Cooperative + 'static,
    {
        let mut member: Member = Box::new(member);
        member.enlist();

        lock(&self.incoming).push(member);
    }

    /// Ticks every member exactly once.
    ///
    /// Members whose tick reports they are finished are disposed and
    /// removed during the same call. Returns `true` if any member remains.
    ///
    /// If a member panics, the panic propagates. Members that finished
    /// earlier in the same pass have already been removed and the
    /// remaining ones are kept, so the pool stays usable.
    ///
    /// # Panics
    ///
    /// Panics if called from inside this pool's own pass, and whenever a
    /// member panics.
    #[track_caller]
    pub fn update(&self) -> bool {
        self.assert_outside_pass("Pool::update");

        let mut members = lock(&self.members);
        let driving = self.driver.enter();

        members.append(&mut lock(&self.incoming));

        let before = members.len();

        members.retain_mut(|member| {
            if member.update() {
                return true;
            }

            member.dispose();
            false
        });

        let removed = before - members.len();
        if removed > 0 {
            debug!(removed, remaining = members.len(), "pool members finished");
        }
        drop(driving);

        if self.cancel_requested.swap(false, Ordering::AcqRel) {
            debug!(members = members.len(), "applying cancel requested during the pass");

            for member in members.iter_mut().chain(lock(&self.incoming).iter_mut()) {
                member.cancel();
            }
        }

        trace!(members = members.len(), "pool updated");

        !members.is_empty() || !lock(&self.incoming).is_empty()
    }

    /// Drives every member to completion on the calling thread.
    ///
    /// This is a **blocking** call that spins on [`update`](Self::update).
    ///
    /// # Panics
    ///
    /// Panics if called from inside a coroutine tick.
    #[track_caller]
    pub fn wait(&self) {
        context::assert_can_block("Pool::wait");

        while self.update() {}
    }

    /// Aggregate status of the members.
    ///
    /// [`Status::RanToCompletion`] when the pool is empty, the shared status
    /// when every member agrees, [`Status::Running`] otherwise.
    ///
    /// # Panics
    ///
    /// Panics if called from inside this pool's own pass.
    #[track_caller]
    pub fn status(&self) -> Status {
        self.assert_outside_pass("Pool::status");

        let members = lock(&self.members);
        let incoming = lock(&self.incoming);

        Status::aggregate(members.iter().chain(incoming.iter()).map(|member| member.status()))
    }

    /// Cancels every member.
    ///
    /// Members stay in the pool until the next [`update`](Self::update)
    /// removes them. Called from inside this pool's own pass, the request
    /// is applied right after the pass.
    pub fn cancel(&self) {
        if self.driver.is_current() {
            debug!("cancel requested from inside the pass");
            self.cancel_requested.store(true, Ordering::Release);
            return;
        }

        let mut members = lock(&self.members);
        let mut incoming = lock(&self.incoming);

        for member in members.iter_mut().chain(incoming.iter_mut()) {
            member.cancel();
        }
    }

    /// Cancels and disposes every member, then empties the pool.
    ///
    /// # Panics
    ///
    /// Panics if called from inside this pool's own pass.
    #[track_caller]
    pub fn dispose(&self) {
        self.assert_outside_pass("Pool::dispose");

        let mut members = lock(&self.members);
        members.append(&mut lock(&self.incoming));

        if members.is_empty() {
            return;
        }

        for member in members.iter_mut() {
            member.cancel();
        }

        for member in members.iter_mut() {
            member.dispose();
        }

        debug!(disposed = members.len(), "pool disposed");
        members.clear();
    }

    /// Number of members, including those added since the last update.
    ///
    /// # Panics
    ///
    /// Panics if called from inside this pool's own pass.
    #[track_caller]
    pub fn len(&self) -> usize {
        self.assert_outside_pass("Pool::len");

        lock(&self.members).len() + lock(&self.incoming).len()
    }

    /// Returns `true` if the pool has no members.
    #[track_caller]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Panics if the calling thread is running this pool's pass, where the
    /// member set is locked.
    #[track_caller]
    pub(crate) fn assert_outside_pass(&self, operation: &str) {
        self.driver.assert_not_current(operation);
    }
}

impl Default for Pool {
    /// Returns an empty [`Pool`].
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Pool {
    /// Disposes every member still in the pool.
    fn drop(&mut self) {
        self.dispose();
    }
}

impl Cooperative for Pool {
    fn update(&mut self) -> bool {
        Pool::update(self)
    }

    fn status(&self) -> Status {
        Pool::status(self)
    }

    fn cancel(&mut self) {
        Pool::cancel(self)
    }

    fn dispose(&mut self) {
        Pool::dispose(self)
    }
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.driver.is_current() {
            return f.debug_struct("Pool").field("updating", &true).finish_non_exhaustive();
        }

        f.debug_struct("Pool")
            .field("len", &self.len())
            .field("status", &self.status())
            .finish()
    }
}
