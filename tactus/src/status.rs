//! Lifecycle states for coroutines and awaitables.
//!
//! Both enumerations are monotonic: a value only ever moves forward and
//! terminal states are never left.

/// Lifecycle stage of a coroutine, pool or scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Created but not ticked yet; the routine has not been materialized.
    WaitingToRun,

    /// Materialized and not yet finished.
    Running,

    /// The routine was exhausted or produced a result.
    RanToCompletion,

    /// Execution was cancelled before it could complete.
    Canceled,
}

impl Status {
    /// Returns `true` for [`Status::RanToCompletion`] and [`Status::Canceled`].
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::RanToCompletion | Status::Canceled)
    }

    /// Folds member statuses into the status of the collection.
    ///
    /// An empty collection has run to completion. When every member shares
    /// the same status the collection reports it, any mix reports
    /// [`Status::Running`].
    pub fn aggregate<I>(statuses: I) -> Status
    where
        I: IntoIterator<Item = Status>,
    {
        let mut statuses = statuses.into_iter();

        let Some(first) = statuses.next() else {
            return Status::RanToCompletion;
        };

        if statuses.all(|status| status == first) {
            first
        } else {
            Status::Running
        }
    }
}

/// Lifecycle stage of an [`Awaitable`](crate::awaitable::Awaitable).
///
/// Awaitables have no cancelled state of their own: a cancelled owner
/// stops polling its child and disposes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AwaiterStatus {
    /// Not started yet.
    WaitingToRun,

    /// Started and still pending.
    Running,

    /// No longer pending.
    RanToCompletion,
}

impl From<Status> for AwaiterStatus {
    /// A cancelled coroutine can never make progress again, so an owner
    /// waiting on it is released exactly like on completion.
    fn from(status: Status) -> Self {
        match status {
            Status::WaitingToRun => AwaiterStatus::WaitingToRun,
            Status::Running => AwaiterStatus::Running,
            Status::RanToCompletion | Status::Canceled => AwaiterStatus::RanToCompletion,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_collection_has_completed() {
        assert_eq!(Status::aggregate(Vec::<Status>::new()), Status::RanToCompletion);
    }

    #[test]
    fn uniform_members_report_their_status() {
        use Status::*;

        assert_eq!(Status::aggregate([WaitingToRun, WaitingToRun]), WaitingToRun);
        assert_eq!(Status::aggregate([Canceled, Canceled]), Canceled);
        assert_eq!(Status::aggregate([Running]), Running);
    }

    #[test]
    fn mixed_members_are_running() {
        use Status::*;

        assert_eq!(Status::aggregate([WaitingToRun, RanToCompletion]), Running);
        assert_eq!(Status::aggregate([Canceled, RanToCompletion]), Running);
    }

    #[test]
    fn terminal_states() {
        assert!(!Status::WaitingToRun.is_terminal());
        assert!(!Status::Running.is_terminal());
        assert!(Status::RanToCompletion.is_terminal());
        assert!(Status::Canceled.is_terminal());
    }
}
