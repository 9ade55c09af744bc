use crate::status::AwaiterStatus;

use thiserror::Error;

/// Errors reported by the coroutine engine and its awaitables.
///
/// Terminal-state operations (updating a finished coroutine, cancelling
/// twice, ...) are defined no-ops and never produce an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// An awaitable was started from a state other than
    /// [`AwaiterStatus::WaitingToRun`].
    #[error("awaitable cannot be started from the {0:?} state")]
    InvalidState(AwaiterStatus),

    /// The thread backing a background operation panicked.
    #[error("background operation panicked: {0}")]
    OperationPanicked(String),

    /// The completer of a promise was dropped without producing a value.
    #[error("background operation was abandoned before completing")]
    Abandoned,
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
