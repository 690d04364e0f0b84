//! Shutdown sequencing for simple-mutex
//!
//! This crate owns the two process-wide collaborators that exit-safe
//! synchronization primitives consult:
//!
//! - `observer` - the "static teardown has begun" flag, set once and never reset
//! - `verify` - the fatal verifier that aborts the process when an OS call
//!   fails in a way the caller cannot recover from
//!
//! # Design Principles
//!
//! 1. **Narrow global state**: the teardown flag is the only process-wide
//!    mutable value, and it only ever moves from `false` to `true`
//! 2. **Un-catchable failure**: the verifier aborts, it never unwinds
//! 3. **Observable**: both collaborators report through `tracing`
//!
//! # Usage
//!
//! ```ignore
//! fn main() {
//!     let _observer = sm_shutdown::StaticObserver::new();
//!     sm_shutdown::install_exit_hook();
//!     // ... ordinary execution ...
//! } // `_observer` dropped here: teardown has begun
//! ```

pub mod observer;
pub mod verify;

// Re-export commonly used items
pub use observer::{
    begin_static_teardown, install_exit_hook, is_tearing_down_statics, StaticObserver,
    TeardownTrigger,
};
pub use verify::{fatal, verify_ok, verify_or_abort, Location};
