//! PortableMutex integration tests over the target's native lock
//!
//! Teardown is never started in this binary; see `teardown.rs` for that.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::Duration;

use sm_sync::{LifecycleState, PortableMutex};

// ============================================================================
// Helpers
// ============================================================================

/// A counter with no synchronization of its own; only the mutex protects it.
struct UnguardedCounter(UnsafeCell<u64>);

// SAFETY: every access in these tests happens under a PortableMutex guard.
unsafe impl Sync for UnguardedCounter {}

impl UnguardedCounter {
    fn new() -> Self {
        Self(UnsafeCell::new(0))
    }

    /// # Safety
    /// Caller must hold the mutex guarding this counter.
    unsafe fn increment(&self) {
        let value = unsafe { &mut *self.0.get() };
        *value += 1;
    }

    /// # Safety
    /// Caller must hold the mutex guarding this counter.
    unsafe fn get(&self) -> u64 {
        unsafe { *self.0.get() }
    }
}

// ============================================================================
// Mutual exclusion
// ============================================================================

#[test]
fn stress_eight_threads_no_lost_updates() {
    const THREADS: usize = 8;
    const ITERATIONS: usize = 10_000;

    let mutex = Arc::new(PortableMutex::new());
    let counter = Arc::new(UnguardedCounter::new());

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let mutex = mutex.clone();
            let counter = counter.clone();
            thread::spawn(move || {
                for _ in 0..ITERATIONS {
                    mutex.lock();
                    // SAFETY: the mutex is held.
                    unsafe {
                        counter.increment();
                        mutex.unlock();
                    }
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    let _guard = mutex.scoped();
    // SAFETY: the mutex is held.
    assert_eq!(unsafe { counter.get() }, (THREADS * ITERATIONS) as u64);
}

#[test]
fn blocked_locker_released_only_by_unlock() {
    let mutex = Arc::new(PortableMutex::new());
    let acquired = Arc::new(AtomicBool::new(false));

    mutex.lock();

    let waiter = {
        let mutex = mutex.clone();
        let acquired = acquired.clone();
        thread::spawn(move || {
            let _guard = mutex.scoped();
            acquired.store(true, Ordering::SeqCst);
        })
    };

    thread::sleep(Duration::from_millis(100));
    assert!(
        !acquired.load(Ordering::SeqCst),
        "waiter got the lock while it was held"
    );

    // SAFETY: this thread locked above.
    unsafe { mutex.unlock() };
    waiter.join().unwrap();
    assert!(acquired.load(Ordering::SeqCst));
}

#[test]
fn guard_hands_off_between_threads() {
    let mutex = Arc::new(PortableMutex::new());
    let inside = Arc::new(AtomicBool::new(false));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let mutex = mutex.clone();
            let inside = inside.clone();
            thread::spawn(move || {
                for _ in 0..500 {
                    let _guard = mutex.scoped();
                    assert!(!inside.swap(true, Ordering::SeqCst), "two holders");
                    inside.store(false, Ordering::SeqCst);
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn construct_then_destroy() {
    let mutex = PortableMutex::new();
    assert_eq!(mutex.state(), LifecycleState::Live);

    // SAFETY: no other thread uses this mutex and it is not held.
    unsafe { mutex.destroy() };
    assert!(mutex.is_destroyed());
    assert_eq!(mutex.state(), LifecycleState::Destroyed);
}

#[test]
fn destroyed_mutex_never_blocks() {
    let mutex = PortableMutex::new();
    // SAFETY: no other thread uses this mutex and it is not held.
    unsafe { mutex.destroy() };

    // Locking twice would deadlock a live mutex; a destroyed one ignores it.
    mutex.lock();
    mutex.lock();
    // SAFETY: absorbed as a no-op on a destroyed mutex.
    unsafe { mutex.unlock() };
    let _guard = mutex.scoped();
    assert!(mutex.is_destroyed());
}

static RETIRED_LOCK: OnceLock<PortableMutex> = OnceLock::new();

#[test]
fn retired_static_absorbs_late_lockers() {
    let lock = RETIRED_LOCK.get_or_init(PortableMutex::new);
    {
        let _guard = lock.scoped();
    }

    // SAFETY: no thread is using the lock yet.
    unsafe { lock.destroy() };

    let handles: Vec<_> = (0..4)
        .map(|_| {
            thread::spawn(|| {
                let lock = RETIRED_LOCK.get().unwrap();
                for _ in 0..100 {
                    let _guard = lock.scoped();
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
    assert!(lock.is_destroyed());
}

#[test]
fn debug_reports_backend_and_state() {
    let mutex = PortableMutex::new();
    let text = format!("{mutex:?}");
    assert!(text.contains(mutex.backend_name()));
    assert!(text.contains("Live"));
}
