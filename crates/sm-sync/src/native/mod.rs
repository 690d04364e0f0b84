//! Native OS lock backends
//!
//! Each supported platform provides one [`NativeLock`] implementation over
//! its fastest blocking mutual-exclusion object. The backend for the build
//! target is exported as [`OsLock`].
//!
//! | Target    | Backend                 | OS object          |
//! |-----------|-------------------------|--------------------|
//! | `unix`    | [`PthreadLock`]         | `pthread_mutex_t`  |
//! | `windows` | [`CriticalSectionLock`] | `CRITICAL_SECTION` |
//!
//! # Safety Design
//!
//! The raw OS calls are isolated in the per-platform modules. Both OS
//! objects must not move once initialized, so each backend keeps its object
//! in a `Box` and only ever hands the OS a pointer into that allocation.

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
pub use self::unix::PthreadLock;
#[cfg(windows)]
pub use self::windows::CriticalSectionLock;

/// The native lock for the build target.
#[cfg(unix)]
pub type OsLock = PthreadLock;

/// The native lock for the build target.
#[cfg(windows)]
pub type OsLock = CriticalSectionLock;

/// A native lock call reported failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{call} failed with OS code {code}")]
pub struct NativeLockError {
    /// Name of the OS function that failed.
    pub call: &'static str,
    /// Raw return value or error code reported by the OS.
    pub code: i32,
}

impl NativeLockError {
    pub const fn new(call: &'static str, code: i32) -> Self {
        Self { call, code }
    }
}

/// The capability set of a native blocking mutex: create, acquire, release,
/// destroy.
///
/// # Safety
///
/// Implementors must guarantee that between a successful `acquire` and the
/// matching `release` no other thread's `acquire` returns, and that the
/// value may be shared across threads (`Send + Sync`).
pub unsafe trait NativeLock: Send + Sync {
    /// Human-readable backend name for diagnostics.
    const NAME: &'static str;

    /// Allocate and initialize the OS object.
    fn create() -> Result<Self, NativeLockError>
    where
        Self: Sized;

    /// Block the calling OS thread until exclusive ownership is acquired.
    ///
    /// # Safety
    ///
    /// `destroy` must not have been called.
    unsafe fn acquire(&self) -> Result<(), NativeLockError>;

    /// Release exclusive ownership.
    ///
    /// # Safety
    ///
    /// `destroy` must not have been called, and the calling thread must hold
    /// the lock.
    unsafe fn release(&self) -> Result<(), NativeLockError>;

    /// Release the OS object. The backing memory stays allocated until the
    /// value is dropped.
    ///
    /// # Safety
    ///
    /// Must be called at most once, while no thread holds or is waiting on
    /// the lock.
    unsafe fn destroy(&self) -> Result<(), NativeLockError>;
}
