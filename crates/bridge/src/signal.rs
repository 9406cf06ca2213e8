//! Interrupt Handling
//!
//! Registers a SIGINT handler that raises the shared shutdown flags. The
//! handler body is restricted to atomic stores, the async-signal-safe
//! subset of what [`Controls`] offers; waking the condvar-blocked send loop
//! is left to its bounded trigger wait.

use crate::control::Controls;
use std::sync::{Arc, OnceLock};

/// Handle the signal handler reaches the controls through. Installed once;
/// a second install keeps the first target.
static SIGNAL_TARGET: OnceLock<Arc<Controls>> = OnceLock::new();

/// Install the SIGINT handler targeting `controls`.
///
/// Registration failure is fatal to the caller: without the handler there
/// is no way to shut the workers down from outside.
#[cfg(unix)]
pub fn install_sigint(controls: Arc<Controls>) -> std::io::Result<()> {
    let _ = SIGNAL_TARGET.set(controls);

    // SAFETY: sigaction with a zeroed struct and a handler that performs
    // only atomic stores. sa_flags deliberately left zero so a blocking
    // read on the main thread returns EINTR instead of restarting.
    unsafe {
        let mut action: libc::sigaction = std::mem::zeroed();
        action.sa_sigaction = handle_sigint as libc::sighandler_t;
        if libc::sigaction(libc::SIGINT, &action, std::ptr::null_mut()) != 0 {
            return Err(std::io::Error::last_os_error());
        }
    }
    Ok(())
}

#[cfg(not(unix))]
pub fn install_sigint(controls: Arc<Controls>) -> std::io::Result<()> {
    let _ = SIGNAL_TARGET.set(controls);
    tracing::warn!("no SIGINT handling on this platform, use 'q' to quit");
    Ok(())
}

#[cfg(unix)]
extern "C" fn handle_sigint(_signum: libc::c_int) {
    if let Some(controls) = SIGNAL_TARGET.get() {
        controls.raise_shutdown_flags();
    }
}
