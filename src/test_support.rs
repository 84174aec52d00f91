use std::sync::{Mutex, MutexGuard, PoisonError};

static FACILITIES: Mutex<()> = Mutex::new(());

/// Serializes tests that touch process-wide instrument state
pub(crate) fn facilities_lock() -> MutexGuard<'static, ()> {
    FACILITIES.lock().unwrap_or_else(PoisonError::into_inner)
}
