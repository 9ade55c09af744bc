use super::Awaitable;
use crate::error::{Error, Result};
use crate::status::AwaiterStatus;

use std::time::{Duration, Instant};

use tracing::trace;

/// Creates an awaitable that completes after the given duration.
///
/// The clock starts when the owning coroutine attaches the delay, not
/// when it is created.
///
/// # Examples
///
/// ```rust,ignore
/// use std::time::Duration;
///
/// let coroutine = Coroutine::from_async(|co: Co<()>| async move {
///     co.wait(delay(Duration::from_millis(10))).await;
/// });
/// ```
pub fn delay(duration: Duration) -> Delay {
    Delay::new(duration)
}

/// An awaitable that stays pending until a duration has elapsed.
///
/// Elapsed time is measured with the monotonic [`Instant`] clock and only
/// checked when the owner polls, so the delay completes on the first tick
/// at or after its deadline.
#[derive(Debug)]
pub struct Delay {
    /// How long the delay stays pending once started.
    duration: Duration,

    /// Point in time at which the delay was started.
    started: Option<Instant>,

    status: AwaiterStatus,
}

impl Delay {
    /// Creates a new `Delay` that completes `duration` after being started.
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            started: None,
            status: AwaiterStatus::WaitingToRun,
        }
    }

    /// Creates a new `Delay` from a number of milliseconds.
    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    /// The configured duration.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Time elapsed since the delay was started, if it was.
    pub fn elapsed(&self) -> Option<Duration> {
        self.started.map(|started| started.elapsed())
    }
}

impl Awaitable for Delay {
    fn status(&self) -> AwaiterStatus {
        self.status
    }

    fn start(&mut self) -> Result<()> {
        if self.status != AwaiterStatus::WaitingToRun {
            return Err(Error::InvalidState(self.status));
        }

        self.started = Some(Instant::now());
        self.status = AwaiterStatus::Running;
        Ok(())
    }

    fn poll(&mut self) -> bool {
        match (self.status, self.started) {
            (AwaiterStatus::Running, Some(started)) => {
                if started.elapsed() < self.duration {
                    return true;
                }

                trace!(duration = ?self.duration, "delay elapsed");
                self.status = AwaiterStatus::RanToCompletion;
                false
            }
            (AwaiterStatus::RanToCompletion, _) => false,
            _ => true,
        }
    }
}
