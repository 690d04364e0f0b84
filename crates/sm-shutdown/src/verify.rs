//! Fatal verifier
//!
//! Some failures leave the process in a state nothing can safely continue
//! from: a mutex that could not be created, or an OS lock call that reported
//! an invalid object. These are not errors to hand back to a caller. The
//! verifier writes a diagnostic and aborts.
//!
//! Abort, not panic: a panic can be caught with `catch_unwind` or swallowed
//! by a thread boundary, and an abort cannot.

use std::fmt;
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe, Location as CallerLocation};

/// Source position of a failed verification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Location {
    pub file: &'static str,
    pub line: u32,
}

impl Location {
    /// Location of the caller of the function this is used in.
    #[track_caller]
    pub fn caller() -> Self {
        let loc = CallerLocation::caller();
        Self {
            file: loc.file(),
            line: loc.line(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Abort the process if `condition` is false.
///
/// `what` describes the condition for the diagnostic, which reports the
/// caller's source location.
#[inline]
#[track_caller]
pub fn verify_or_abort(condition: bool, what: &str) {
    if !condition {
        fatal(what, Location::caller());
    }
}

/// Unwrap `result`, aborting the process with a diagnostic on `Err`.
#[inline]
#[track_caller]
pub fn verify_ok<T, E: fmt::Display>(result: Result<T, E>, what: &str) -> T {
    match result {
        Ok(value) => value,
        Err(err) => fatal(&format!("{what}: {err}"), Location::caller()),
    }
}

/// Write a diagnostic and abort the process.
///
/// The message goes to `tracing` and to stderr: exit-time failures often
/// happen after the host's subscriber has been torn down. Neither a failed
/// stderr write nor a panicking subscriber can keep this from aborting.
#[cold]
#[inline(never)]
pub fn fatal(what: &str, location: Location) -> ! {
    let _ = panic::catch_unwind(AssertUnwindSafe(|| {
        tracing::error!(%location, condition = what, "verify failed, aborting");
        let _ = writeln!(io::stderr(), "fatal: verify failed at {location}: {what}");
    }));
    std::process::abort()
}

/// Abort the process if a condition does not hold.
///
/// ```ignore
/// sm_shutdown::verify!(rc == 0);
/// sm_shutdown::verify!(rc == 0, "pthread_mutex_init");
/// ```
#[macro_export]
macro_rules! verify {
    ($cond:expr $(,)?) => {
        if !$cond {
            $crate::verify::fatal(
                ::core::stringify!($cond),
                $crate::verify::Location {
                    file: ::core::file!(),
                    line: ::core::line!(),
                },
            )
        }
    };
    ($cond:expr, $context:expr $(,)?) => {
        if !$cond {
            $crate::verify::fatal(
                &::std::format!("{} ({})", $context, ::core::stringify!($cond)),
                $crate::verify::Location {
                    file: ::core::file!(),
                    line: ::core::line!(),
                },
            )
        }
    };
}
