//! Static teardown observer
//!
//! A single process-wide flag that records whether the process has left
//! ordinary execution and is now running exit-time destructors. Objects with
//! process lifetime consult it to decide whether releasing OS resources is
//! still meaningful, or whether the OS is about to reclaim everything anyway.
//!
//! # Invariants
//!
//! 1. **Monotonic**: the flag moves from `false` to `true` at most once
//! 2. **Never reset**: no API clears it

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Once;

static DESTROYING_STATICS: AtomicBool = AtomicBool::new(false);

static EXIT_HOOK: Once = Once::new();
static EXIT_HOOK_INSTALLED: AtomicBool = AtomicBool::new(false);

/// What caused static teardown to begin. Only used for logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TeardownTrigger {
    /// A [`StaticObserver`] was dropped.
    ObserverDropped,
    /// The C runtime ran the handler registered by [`install_exit_hook`].
    ProcessExit,
    /// Host code called [`begin_static_teardown`] directly.
    Explicit,
}

impl fmt::Display for TeardownTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ObserverDropped => "observer dropped",
            Self::ProcessExit => "process exit",
            Self::Explicit => "explicit",
        };
        f.write_str(name)
    }
}

/// Returns `true` once static teardown has begun.
#[inline]
pub fn is_tearing_down_statics() -> bool {
    DESTROYING_STATICS.load(Ordering::Acquire)
}

/// Mark the start of static teardown.
///
/// Idempotent: only the first call flips the flag and logs. Returns `true`
/// if this call performed the transition.
pub fn begin_static_teardown(trigger: TeardownTrigger) -> bool {
    let first = !DESTROYING_STATICS.swap(true, Ordering::AcqRel);
    if first {
        tracing::info!(%trigger, "static teardown has begun");
    }
    first
}

/// RAII marker for the end of ordinary execution.
///
/// Create one at the top of `main` and keep it alive for the whole run. When
/// it is dropped, every later destructor runs with
/// [`is_tearing_down_statics`] returning `true`.
///
/// Not `Clone`: dropping any copy would end ordinary execution early.
#[must_use = "dropping the observer immediately begins static teardown"]
pub struct StaticObserver {
    _private: (),
}

impl StaticObserver {
    /// Create a new observer. Does not touch the global flag.
    pub const fn new() -> Self {
        Self { _private: () }
    }
}

impl Default for StaticObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for StaticObserver {
    fn drop(&mut self) {
        begin_static_teardown(TeardownTrigger::ObserverDropped);
    }
}

impl fmt::Debug for StaticObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticObserver")
            .field("tearing_down", &is_tearing_down_statics())
            .finish()
    }
}

extern "C" fn on_process_exit() {
    begin_static_teardown(TeardownTrigger::ProcessExit);
}

/// Register a C `atexit` handler that begins static teardown.
///
/// Handlers run in reverse registration order, so call this early: anything
/// registered before it still sees ordinary execution. Registration happens
/// at most once per process. Returns whether the handler is installed.
pub fn install_exit_hook() -> bool {
    EXIT_HOOK.call_once(|| {
        // SAFETY: `on_process_exit` is a plain `extern "C" fn()` with no
        // captured state; it only touches a static atomic, which remains
        // valid for the whole exit sequence.
        let rc = unsafe { libc::atexit(on_process_exit) };
        if rc == 0 {
            EXIT_HOOK_INSTALLED.store(true, Ordering::Release);
            tracing::debug!("static teardown exit hook installed");
        } else {
            tracing::warn!(rc, "failed to register static teardown exit hook");
        }
    });
    EXIT_HOOK_INSTALLED.load(Ordering::Acquire)
}

// ============================================================================
// Tests
// ============================================================================
