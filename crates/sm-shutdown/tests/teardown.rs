//! Static teardown flag tests
//!
//! These flip the process-wide flag, so they live in their own test binary.
//! Every test here expects the flag to end up set; none expects it clear.

use sm_shutdown::{begin_static_teardown, is_tearing_down_statics, StaticObserver, TeardownTrigger};

#[test]
fn observer_drop_begins_teardown() {
    {
        let _observer = StaticObserver::new();
    }
    assert!(is_tearing_down_statics());
}

#[test]
fn explicit_begin_is_idempotent() {
    begin_static_teardown(TeardownTrigger::Explicit);
    assert!(is_tearing_down_statics());

    // Later calls never perform the transition again.
    assert!(!begin_static_teardown(TeardownTrigger::Explicit));
    assert!(!begin_static_teardown(TeardownTrigger::ProcessExit));
    assert!(is_tearing_down_statics());
}

#[test]
fn flag_visible_from_other_threads() {
    begin_static_teardown(TeardownTrigger::Explicit);
    let seen = std::thread::spawn(is_tearing_down_statics).join().unwrap();
    assert!(seen);
}
