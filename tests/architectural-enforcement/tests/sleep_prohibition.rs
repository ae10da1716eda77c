//! Integration Test: Sleep Prohibition
//!
//! **Policy**: Production code in the core and the console MUST NOT call
//! sleep methods. Waiting happens on channels, sockets and
//! `tokio::time::interval`, never on a timer guess.
//! **Exceptions**: test code

use architectural_enforcement::{report, scan};

fn is_sleep(code: &str) -> bool {
    code.contains("::sleep(") || code.contains(".sleep(")
}

#[test]
fn test_no_sleep_in_core() {
    let violations = scan("conductor/core/src", |_| false, is_sleep);
    report("Sleep calls found in core production code", &violations);
}

#[test]
fn test_no_sleep_in_console() {
    let violations = scan("conductor/console/src", |_| false, is_sleep);
    report("Sleep calls found in console production code", &violations);
}
