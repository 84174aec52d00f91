use std::fmt;
use std::panic::Location;
use std::sync::{LockResult, Mutex, MutexGuard, TryLockError, TryLockResult};
use std::time::Instant;

/// A `std::sync::Mutex` that reports contended acquisitions to the
/// lock-contention instrument.
///
/// Uncontended locks cost one `try_lock`; only acquisitions that have to wait
/// are timed.
pub struct ProfiledMutex<T: ?Sized> {
    inner: Mutex<T>,
}

impl<T> ProfiledMutex<T> {
    pub const fn new(value: T) -> Self {
        ProfiledMutex {
            inner: Mutex::new(value),
        }
    }

    pub fn into_inner(self) -> LockResult<T> {
        self.inner.into_inner()
    }
}

impl<T: ?Sized> ProfiledMutex<T> {
    /// Acquire the lock, recording the wait against the caller if it was contended
    #[track_caller]
    pub fn lock(&self) -> LockResult<MutexGuard<'_, T>> {
        match self.inner.try_lock() {
            Ok(guard) => Ok(guard),
            Err(TryLockError::Poisoned(poisoned)) => Err(poisoned),
            Err(TryLockError::WouldBlock) => {
                let location = Location::caller();
                let started = Instant::now();
                let result = self.inner.lock();
                super::record(location, started.elapsed());
                result
            }
        }
    }

    pub fn try_lock(&self) -> TryLockResult<MutexGuard<'_, T>> {
        self.inner.try_lock()
    }

    pub fn get_mut(&mut self) -> LockResult<&mut T> {
        self.inner.get_mut()
    }

    pub fn is_poisoned(&self) -> bool {
        self.inner.is_poisoned()
    }
}

impl<T: Default> Default for ProfiledMutex<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for ProfiledMutex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfiledMutex")
            .field("inner", &&self.inner)
            .finish()
    }
}
