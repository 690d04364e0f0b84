//! Windows backend over `CRITICAL_SECTION`
//!
//! Critical section calls cannot report failure, so every operation here
//! returns `Ok`.

use core::cell::UnsafeCell;

use ::windows::Win32::System::Threading::{
    DeleteCriticalSection, EnterCriticalSection, InitializeCriticalSection,
    LeaveCriticalSection, CRITICAL_SECTION,
};

use super::{NativeLock, NativeLockError};

/// A boxed `CRITICAL_SECTION`.
pub struct CriticalSectionLock {
    inner: Box<UnsafeCell<CRITICAL_SECTION>>,
}

impl CriticalSectionLock {
    #[inline]
    fn raw(&self) -> *mut CRITICAL_SECTION {
        self.inner.get()
    }
}

// SAFETY: critical sections are designed to be shared between threads of
// one process; the object never moves because it lives in its own heap
// allocation.
unsafe impl Send for CriticalSectionLock {}
unsafe impl Sync for CriticalSectionLock {}

// SAFETY: EnterCriticalSection/LeaveCriticalSection provide mutual exclusion
// for an initialized critical section.
unsafe impl NativeLock for CriticalSectionLock {
    const NAME: &'static str = "CRITICAL_SECTION";

    fn create() -> Result<Self, NativeLockError> {
        let lock = Self {
            inner: Box::new(UnsafeCell::new(CRITICAL_SECTION::default())),
        };
        // SAFETY: `raw()` points into a live, uniquely owned allocation.
        unsafe { InitializeCriticalSection(lock.raw()) };
        Ok(lock)
    }

    unsafe fn acquire(&self) -> Result<(), NativeLockError> {
        // SAFETY: caller guarantees the critical section is initialized.
        unsafe { EnterCriticalSection(self.raw()) };
        Ok(())
    }

    unsafe fn release(&self) -> Result<(), NativeLockError> {
        // SAFETY: caller guarantees the section is live and owned by this thread.
        unsafe { LeaveCriticalSection(self.raw()) };
        Ok(())
    }

    unsafe fn destroy(&self) -> Result<(), NativeLockError> {
        // SAFETY: caller guarantees a single call with no owner or waiter.
        unsafe { DeleteCriticalSection(self.raw()) };
        Ok(())
    }
}
