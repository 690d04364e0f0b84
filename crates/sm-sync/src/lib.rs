//! Exit-safe portable mutex
//!
//! A minimal mutual-exclusion lock over the host OS's native blocking lock,
//! intended for long-lived and often statically stored objects. Beyond plain
//! lock/unlock it guarantees one thing: a lock or unlock that races with the
//! mutex's own destruction during process exit never touches a dead OS
//! object.
//!
//! # Module Organization
//!
//! - `native` - per-platform native lock backends behind the `NativeLock` trait
//! - `lifecycle` - the live/retiring/destroyed state machine
//! - `mutex` - `PortableMutex` and its scoped guard
//! - `loom_tests` - Concurrency tests using loom (with `loom` feature)
//!
//! # Failure Policy
//!
//! OS failures while the mutex is live abort the process through
//! `sm_shutdown::verify_ok`. Calls absorbed after destruction are not
//! failures. No error is ever returned to the caller.
//!
//! # Verification
//!
//! 1. **Kani proofs** (`cargo kani`): lifecycle state machine invariants
//! 2. **Loom tests** (`cargo test --features loom`): retirement races
//! 3. **Unit and integration tests**: mutual exclusion and lifecycle

pub mod lifecycle;
pub mod mutex;
pub mod native;


// Re-export commonly used items
pub use lifecycle::LifecycleState;
pub use mutex::{PortableMutex, PortableMutexGuard};
pub use native::{NativeLock, NativeLockError, OsLock};
