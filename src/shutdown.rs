//! SIGINT latch for stopping the live monitor.
//!
//! The handler only stores an atomic, keeping it async-signal-safe; both
//! session loops poll the latch alongside their own running flag.

use std::sync::atomic::{AtomicBool, Ordering};

static REQUESTED: AtomicBool = AtomicBool::new(false);

/// Install the SIGINT handler. Safe to call more than once.
#[cfg(unix)]
pub fn install() {
    unsafe {
        libc::signal(libc::SIGINT, handle_sigint as libc::sighandler_t);
    }
}

#[cfg(not(unix))]
pub fn install() {}

/// True once Ctrl+C has been pressed.
pub fn requested() -> bool {
    REQUESTED.load(Ordering::SeqCst)
}

#[cfg(unix)]
extern "C" fn handle_sigint(_: libc::c_int) {
    REQUESTED.store(true, Ordering::SeqCst);
}
