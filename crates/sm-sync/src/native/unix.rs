//! POSIX backend over `pthread_mutex_t`

use core::cell::UnsafeCell;
use core::ptr;

use super::{NativeLock, NativeLockError};

/// A boxed `pthread_mutex_t` with default attributes.
pub struct PthreadLock {
    inner: Box<UnsafeCell<libc::pthread_mutex_t>>,
}

impl PthreadLock {
    #[inline]
    fn raw(&self) -> *mut libc::pthread_mutex_t {
        self.inner.get()
    }
}

#[inline]
fn cvt(call: &'static str, rc: libc::c_int) -> Result<(), NativeLockError> {
    if rc == 0 {
        Ok(())
    } else {
        Err(NativeLockError::new(call, rc))
    }
}

// SAFETY: pthread mutexes are designed to be shared between threads; the
// object never moves because it lives in its own heap allocation.
unsafe impl Send for PthreadLock {}
unsafe impl Sync for PthreadLock {}

// SAFETY: pthread_mutex_lock/unlock provide mutual exclusion for a mutex
// initialized with pthread_mutex_init.
unsafe impl NativeLock for PthreadLock {
    const NAME: &'static str = "pthread_mutex_t";

    fn create() -> Result<Self, NativeLockError> {
        let lock = Self {
            inner: Box::new(UnsafeCell::new(libc::PTHREAD_MUTEX_INITIALIZER)),
        };
        // SAFETY: `raw()` points into a live, uniquely owned allocation.
        // A null attribute pointer selects the default mutex type.
        cvt("pthread_mutex_init", unsafe {
            libc::pthread_mutex_init(lock.raw(), ptr::null())
        })?;
        Ok(lock)
    }

    unsafe fn acquire(&self) -> Result<(), NativeLockError> {
        // SAFETY: caller guarantees the mutex has not been destroyed.
        cvt("pthread_mutex_lock", unsafe {
            libc::pthread_mutex_lock(self.raw())
        })
    }

    unsafe fn release(&self) -> Result<(), NativeLockError> {
        // SAFETY: caller guarantees the mutex is live and held by this thread.
        cvt("pthread_mutex_unlock", unsafe {
            libc::pthread_mutex_unlock(self.raw())
        })
    }

    unsafe fn destroy(&self) -> Result<(), NativeLockError> {
        // SAFETY: caller guarantees a single call with no holder or waiter.
        cvt("pthread_mutex_destroy", unsafe {
            libc::pthread_mutex_destroy(self.raw())
        })
    }
}
