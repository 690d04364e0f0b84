//! Lifecycle state of an exit-safe lock
//!
//! A lock is `Live` from construction until it is retired. Retirement is a
//! two-step transition so that at most one caller ever releases the native
//! object, while lock/unlock keep using it until release has finished:
//!
//! ```text
//! Live --begin_retire--> Retiring --finish_retire--> Destroyed
//! ```
//!
//! # Invariants
//!
//! 1. **Single retirement**: `begin_retire` succeeds at most once
//! 2. **Monotonic**: the state never moves backward
//! 3. **Destroyed is last**: `Destroyed` is only published after the native
//!    object has been released (or deliberately skipped)
//!
//! # Verification
//!
//! This module includes Kani proofs for the above invariants.

#[cfg(all(test, feature = "loom"))]
use loom::sync::atomic::{AtomicU8, Ordering};

#[cfg(not(all(test, feature = "loom")))]
use core::sync::atomic::{AtomicU8, Ordering};

const LIVE: u8 = 0;
const RETIRING: u8 = 1;
const DESTROYED: u8 = 2;

/// Observable lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    /// Lock and unlock reach the native object.
    Live,
    /// Retirement has started; the native object is being released.
    Retiring,
    /// Lock and unlock are no-ops.
    Destroyed,
}

/// Atomic lifecycle cell embedded in every lock.
pub(crate) struct Lifecycle {
    state: AtomicU8,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicU8::new(LIVE),
        }
    }

    /// `true` once retirement has completed.
    #[inline]
    pub(crate) fn is_destroyed(&self) -> bool {
        self.state.load(Ordering::Acquire) == DESTROYED
    }

    /// Claim the right to retire. Returns `false` if another caller already
    /// started (or finished) retirement.
    pub(crate) fn begin_retire(&self) -> bool {
        self.state
            .compare_exchange(LIVE, RETIRING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Publish `Destroyed`. Only the caller whose `begin_retire` succeeded
    /// may call this.
    pub(crate) fn finish_retire(&self) {
        let prev = self.state.swap(DESTROYED, Ordering::AcqRel);
        debug_assert_eq!(prev, RETIRING, "finish_retire without begin_retire");
    }

    pub(crate) fn state(&self) -> LifecycleState {
        match self.state.load(Ordering::Acquire) {
            LIVE => LifecycleState::Live,
            RETIRING => LifecycleState::Retiring,
            _ => LifecycleState::Destroyed,
        }
    }
}

// ============================================================================
// Kani Proofs for Lifecycle Invariants
// ============================================================================

#[cfg(kani)]
mod proofs {
    use super::*;

    /// Proof: retirement can only be claimed once
    #[kani::proof]
    fn single_retirement() {
        let lifecycle = Lifecycle::new();
        let attempts: u8 = kani::any();
        kani::assume(attempts > 0 && attempts <= 4);

        let mut claimed = 0;
        for _ in 0..attempts {
            if lifecycle.begin_retire() {
                claimed += 1;
            }
        }
        kani::assert(claimed == 1, "exactly one caller may begin retirement");
    }

    /// Proof: Destroyed is only observable after finish_retire
    #[kani::proof]
    fn destroyed_only_after_finish() {
        let lifecycle = Lifecycle::new();
        kani::assert(!lifecycle.is_destroyed(), "new lifecycle is live");

        if kani::any() {
            kani::assert(lifecycle.begin_retire(), "first claim succeeds");
            kani::assert(!lifecycle.is_destroyed(), "retiring is not destroyed");
            lifecycle.finish_retire();
            kani::assert(lifecycle.is_destroyed(), "finish publishes destroyed");
        }
    }

    /// Proof: the state never moves backward
    #[kani::proof]
    fn state_monotonic() {
        let lifecycle = Lifecycle::new();
        lifecycle.begin_retire();
        lifecycle.finish_retire();

        // Any later claim fails and leaves the state untouched.
        let again = lifecycle.begin_retire();
        kani::assert(!again, "destroyed cannot be re-claimed");
        kani::assert(
            lifecycle.state() == LifecycleState::Destroyed,
            "destroyed is terminal",
        );
    }
}

#[cfg(all(test, not(feature = "loom")))]
mod tests {
    use super::*;

    #[test]
    fn test_starts_live() {
        let lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.state(), LifecycleState::Live);
        assert!(!lifecycle.is_destroyed());
    }

    #[test]
    fn test_retire_transitions() {
        let lifecycle = Lifecycle::new();

        assert!(lifecycle.begin_retire());
        assert_eq!(lifecycle.state(), LifecycleState::Retiring);
        assert!(!lifecycle.is_destroyed());

        lifecycle.finish_retire();
        assert_eq!(lifecycle.state(), LifecycleState::Destroyed);
        assert!(lifecycle.is_destroyed());
    }

    #[test]
    fn test_second_claim_fails() {
        let lifecycle = Lifecycle::new();
        assert!(lifecycle.begin_retire());
        assert!(!lifecycle.begin_retire());

        lifecycle.finish_retire();
        assert!(!lifecycle.begin_retire());
        assert_eq!(lifecycle.state(), LifecycleState::Destroyed);
    }

    #[test]
    fn test_concurrent_claims_single_winner() {
        let lifecycle = std::sync::Arc::new(Lifecycle::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let lifecycle = lifecycle.clone();
                std::thread::spawn(move || lifecycle.begin_retire())
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }
}
