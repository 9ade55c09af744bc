use super::Operation;
use crate::error::{Error, Result};
use crate::utils::lock;

use std::sync::{Arc, Mutex};

/// Creates a linked [`Promise`]/[`Completer`] pair.
///
/// The promise is handed to a [`Background`](super::Background) awaitable
/// while the host keeps the completer and signals completion from
/// wherever its own asynchronous work finishes, including other threads.
///
/// # Examples
///
/// ```rust,ignore
/// let (promise, completer) = promise();
/// let download = Background::from_operation(promise);
///
/// // later, from the host's callback:
/// completer.complete(bytes);
/// ```
pub fn promise<T>() -> (Promise<T>, Completer<T>) {
    let state = Arc::new(Mutex::new(None));

    let promise = Promise {
        state: state.clone(),
    };
    let completer = Completer { state: Some(state) };

    (promise, completer)
}

type State<T> = Arc<Mutex<Option<Result<T>>>>;

/// Receiving half of a [`promise`] pair.
pub struct Promise<T> {
    state: State<T>,
}

impl<T> Promise<T> {
    /// Returns `true` once the completer has produced an outcome.
    pub fn is_finished(&self) -> bool {
        lock(&self.state).is_some()
    }
}

impl<T: Send + 'static> Operation for Promise<T> {
    type Output = Result<T>;

    fn poll_output(&mut self) -> Option<Result<T>> {
        lock(&self.state).take()
    }
}

/// Sending half of a [`promise`] pair.
///
/// Dropping the completer without calling [`complete`](Completer::complete)
/// resolves the promise with [`Error::Abandoned`].
pub struct Completer<T> {
    state: Option<State<T>>,
}

impl<T> Completer<T> {
    /// Resolves the promise with `value`.
    pub fn complete(mut self, value: T) {
        if let Some(state) = self.state.take() {
            *lock(&state) = Some(Ok(value));
        }
    }
}

impl<T> Drop for Completer<T> {
    fn drop(&mut self) {
        if let Some(state) = self.state.take() {
            *lock(&state) = Some(Err(Error::Abandoned));
        }
    }
}
