// Mutex access for the short critical sections in this crate.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock `mutex`, taking the guard back if a previous holder panicked.
///
/// Guarded values here are plain maps, handles and counters that stay
/// valid across a panic.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
