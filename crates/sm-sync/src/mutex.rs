//! Exit-safe portable mutex
//!
//! [`PortableMutex`] is a plain lock/unlock mutex over the native OS lock
//! with one extra guarantee: a lock or unlock that races with the mutex
//! being destroyed during process exit is absorbed as a no-op instead of
//! touching a dead OS object.
//!
//! # Lifecycle
//!
//! - **Construction** creates the native lock. Failure aborts the process.
//! - **Destruction** (on `Drop`, or [`PortableMutex::destroy`] for storage
//!   that outlives the mutex) releases the native lock, unless static
//!   teardown has begun, in which case the OS object is left for process
//!   exit to reclaim. Either way the mutex ends up destroyed.
//! - **Destroyed** mutexes ignore `lock` and `unlock`.
//!
//! # Copying
//!
//! The mutex is tied to one OS object, so it is neither `Clone` nor `Copy`:
//!
//! ```compile_fail
//! let a = sm_sync::PortableMutex::new();
//! let b = a.clone();
//! ```
//!
//! ```compile_fail
//! let a = sm_sync::PortableMutex::new();
//! let mut b = sm_sync::PortableMutex::new();
//! let r = &a;
//! b = *r;
//! ```
//!
//! ```compile_fail
//! fn assert_copy<T: Copy>() {}
//! assert_copy::<sm_sync::PortableMutex>();
//! ```

use core::fmt;
use core::marker::PhantomData;

use sm_shutdown::{is_tearing_down_statics, verify_ok};

use crate::lifecycle::{Lifecycle, LifecycleState};
use crate::native::{NativeLock, OsLock};

/// A blocking mutual-exclusion lock that is safe to race with its own
/// exit-time destruction.
///
/// No try-lock, no timeout, no recursion. Locking twice from one thread is a
/// usage error whose outcome (deadlock or abort) depends on the platform.
///
/// # Usage
///
/// ```
/// use std::sync::OnceLock;
/// use sm_sync::PortableMutex;
///
/// static SSL_MANAGER_LOCK: OnceLock<PortableMutex> = OnceLock::new();
///
/// let lock = SSL_MANAGER_LOCK.get_or_init(PortableMutex::new);
/// {
///     let _guard = lock.scoped();
///     // critical section
/// }
/// ```
pub struct PortableMutex<L: NativeLock = OsLock> {
    native: L,
    lifecycle: Lifecycle,
}

impl PortableMutex<OsLock> {
    /// Create a mutex over the target's native lock.
    ///
    /// Aborts the process if the OS cannot create the lock.
    #[track_caller]
    pub fn new() -> Self {
        Self::with_backend()
    }
}

impl Default for PortableMutex<OsLock> {
    #[track_caller]
    fn default() -> Self {
        Self::new()
    }
}

impl<L: NativeLock> PortableMutex<L> {
    /// Create a mutex over an explicit backend.
    ///
    /// Aborts the process if the backend cannot create its lock.
    #[track_caller]
    pub fn with_backend() -> Self {
        let native = verify_ok(L::create(), "native lock creation");
        tracing::trace!(backend = L::NAME, "native lock created");
        Self {
            native,
            lifecycle: Lifecycle::new(),
        }
    }

    /// Block the calling thread until it holds the lock.
    ///
    /// Returns immediately, holding nothing, if the mutex has been
    /// destroyed. Aborts the process if the OS reports failure.
    #[track_caller]
    pub fn lock(&self) {
        if self.lifecycle.is_destroyed() {
            tracing::debug!(backend = L::NAME, "lock on destroyed mutex ignored");
            return;
        }
        // SAFETY: retirement has not completed. `destroy` callers promise no
        // concurrent lock/unlock outside process exit, where a call that
        // passed the check above is the accepted best-effort window.
        verify_ok(unsafe { self.native.acquire() }, "native lock acquire");
    }

    /// Release the lock.
    ///
    /// A no-op if the mutex has been destroyed. Aborts the process if the OS
    /// reports failure.
    ///
    /// # Safety
    ///
    /// The calling thread must hold the lock, acquired through [`lock`].
    /// Prefer [`scoped`], which pairs the two for you.
    ///
    /// [`lock`]: Self::lock
    /// [`scoped`]: Self::scoped
    #[track_caller]
    pub unsafe fn unlock(&self) {
        if self.lifecycle.is_destroyed() {
            tracing::debug!(backend = L::NAME, "unlock on destroyed mutex ignored");
            return;
        }
        // SAFETY: caller holds the lock; liveness as in `lock`.
        verify_ok(unsafe { self.native.release() }, "native lock release");
    }

    /// Lock, returning a guard that unlocks when dropped.
    #[track_caller]
    pub fn scoped(&self) -> PortableMutexGuard<'_, L> {
        self.lock();
        PortableMutexGuard {
            mutex: self,
            _not_send: PhantomData,
        }
    }

    /// Destroy the mutex in place.
    ///
    /// Releases the native lock unless static teardown has begun, then marks
    /// the mutex destroyed so every later `lock`/`unlock` is a no-op. Only
    /// the first call has any effect. `Drop` calls this; call it directly
    /// for a mutex whose storage is never dropped, such as a `static`.
    ///
    /// Aborts the process if the OS refuses to release the lock, for example
    /// because it is still held.
    ///
    /// # Safety
    ///
    /// No other thread may be inside `lock` or `unlock` on this mutex, and
    /// the lock must not be held, unless the process is exiting.
    #[track_caller]
    pub unsafe fn destroy(&self) {
        if !self.lifecycle.begin_retire() {
            return;
        }
        if is_tearing_down_statics() {
            tracing::debug!(
                backend = L::NAME,
                "static teardown in progress, leaving native lock to the OS"
            );
        } else {
            // SAFETY: `begin_retire` succeeded, so this is the only release;
            // the caller guarantees no holder or waiter.
            verify_ok(unsafe { self.native.destroy() }, "native lock destroy");
            tracing::trace!(backend = L::NAME, "native lock destroyed");
        }
        self.lifecycle.finish_retire();
    }

    /// `true` once the mutex has been destroyed.
    pub fn is_destroyed(&self) -> bool {
        self.lifecycle.is_destroyed()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Name of the native backend.
    pub fn backend_name(&self) -> &'static str {
        L::NAME
    }

    #[cfg(all(test, feature = "loom"))]
    pub(crate) fn native_for_tests(&self) -> &L {
        &self.native
    }
}

impl<L: NativeLock> Drop for PortableMutex<L> {
    fn drop(&mut self) {
        // SAFETY: `&mut self` rules out any concurrent lock/unlock.
        unsafe { self.destroy() };
    }
}

impl<L: NativeLock> fmt::Debug for PortableMutex<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortableMutex")
            .field("backend", &L::NAME)
            .field("state", &self.state())
            .finish()
    }
}

// ============================================================================
// Scoped guard
// ============================================================================

/// Holds a [`PortableMutex`] locked until dropped.
///
/// Not `Send`: native locks must be released by the thread that acquired
/// them.
#[must_use = "if unused the mutex will immediately unlock"]
pub struct PortableMutexGuard<'a, L: NativeLock = OsLock> {
    mutex: &'a PortableMutex<L>,
    _not_send: PhantomData<*const ()>,
}

impl<L: NativeLock> Drop for PortableMutexGuard<'_, L> {
    fn drop(&mut self) {
        // SAFETY: the guard exists only while this thread holds the lock.
        unsafe { self.mutex.unlock() };
    }
}

impl<L: NativeLock> fmt::Debug for PortableMutexGuard<'_, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortableMutexGuard")
            .field("mutex", self.mutex)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
