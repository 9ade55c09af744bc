use crate::utils::lock;

use std::fmt;
use std::sync::{Arc, Mutex};

/// Shared container receiving the value of an awaitable.
///
/// Cloning a cell yields another handle to the same storage. The
/// awaitable writes into it when it completes and the routine reads it
/// after its await has returned.
pub struct ResultCell<T> {
    value: Arc<Mutex<Option<T>>>,
}

impl<T> ResultCell<T> {
    /// Creates an empty cell.
    pub fn new() -> Self {
        Self {
            value: Arc::new(Mutex::new(None)),
        }
    }

    /// Stores `value`, replacing any previous one.
    pub fn set(&self, value: T) {
        *lock(&self.value) = Some(value);
    }

    /// Removes and returns the stored value.
    pub fn take(&self) -> Option<T> {
        lock(&self.value).take()
    }

    /// Returns `true` if a value is stored.
    pub fn is_set(&self) -> bool {
        lock(&self.value).is_some()
    }
}

impl<T: Clone> ResultCell<T> {
    /// Returns a copy of the stored value, leaving it in place.
    pub fn get(&self) -> Option<T> {
        lock(&self.value).clone()
    }
}

impl<T> Clone for ResultCell<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
        }
    }
}

impl<T> Default for ResultCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for ResultCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ResultCell").field(&*lock(&self.value)).finish()
    }
}
