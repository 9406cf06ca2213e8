//! Shared Control Flags
//!
//! One context object owns every flag the two worker loops share: the
//! one-shot cancellation flag, the transport force-return flag, and the
//! coalescing send trigger. Constructed once at startup and handed to both
//! loops behind an `Arc`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Control state shared by the acquisition loop, the send loop and the
/// main thread.
///
/// The trigger is a plain armed/not-armed bit, not a queue: arming while
/// already armed is a no-op, so rapid re-arms while a send is in flight
/// coalesce into the next drain.
pub struct Controls {
    cancel: AtomicBool,
    force_return: AtomicBool,
    trigger: Mutex<bool>,
    trigger_cv: Condvar,
}

impl Controls {
    pub fn new() -> Self {
        Self {
            cancel: AtomicBool::new(false),
            force_return: AtomicBool::new(false),
            trigger: Mutex::new(false),
            trigger_cv: Condvar::new(),
        }
    }

    /// Set the cancellation and force-return flags.
    ///
    /// This is the async-signal-safe subset of [`request_shutdown`]: plain
    /// atomic stores only, callable from a signal handler.
    ///
    /// [`request_shutdown`]: Self::request_shutdown
    pub fn raise_shutdown_flags(&self) {
        self.cancel.store(true, Ordering::SeqCst);
        self.force_return.store(true, Ordering::SeqCst);
    }

    /// Request cooperative shutdown and wake any thread waiting on the
    /// trigger.
    pub fn request_shutdown(&self) {
        self.raise_shutdown_flags();
        self.trigger_cv.notify_all();
    }

    /// Whether shutdown has been requested. Never reverts to false.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Whether an in-flight blocking collaborator call should be abandoned.
    pub fn force_return_requested(&self) -> bool {
        self.force_return.load(Ordering::SeqCst)
    }

    /// Arm the send trigger and wake the send loop. No-op when already armed.
    pub fn arm_trigger(&self) {
        let mut armed = self.lock_trigger();
        if !*armed {
            *armed = true;
            self.trigger_cv.notify_one();
        }
    }

    /// Clear the send trigger after a drain.
    pub fn disarm_trigger(&self) {
        *self.lock_trigger() = false;
    }

    /// Wait until the trigger is armed, or until `timeout` elapses.
    ///
    /// Returns whether the trigger is armed. The wait is bounded so the
    /// caller re-checks cancellation at least once per `timeout`.
    pub fn wait_armed(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut armed = self.lock_trigger();
        while !*armed {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (guard, wait) = self
                .trigger_cv
                .wait_timeout(armed, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            armed = guard;
            if wait.timed_out() {
                return *armed;
            }
        }
        true
    }

    fn lock_trigger(&self) -> std::sync::MutexGuard<'_, bool> {
        self.trigger.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Controls {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn trigger_starts_disarmed() {
        let controls = Controls::new();
        assert!(!controls.wait_armed(Duration::from_millis(10)));
    }

    #[test]
    fn arm_wait_disarm_cycle() {
        let controls = Controls::new();
        controls.arm_trigger();
        assert!(controls.wait_armed(Duration::from_millis(10)));
        controls.disarm_trigger();
        assert!(!controls.wait_armed(Duration::from_millis(10)));
    }

    #[test]
    fn double_arm_coalesces_to_one_drain() {
        let controls = Controls::new();
        controls.arm_trigger();
        controls.arm_trigger();
        assert!(controls.wait_armed(Duration::from_millis(10)));
        controls.disarm_trigger();
        // The second arm must not leave a pending drain behind.
        assert!(!controls.wait_armed(Duration::from_millis(10)));
    }

    #[test]
    fn arm_wakes_a_blocked_waiter() {
        let controls = Arc::new(Controls::new());
        let waiter = {
            let controls = Arc::clone(&controls);
            std::thread::spawn(move || controls.wait_armed(Duration::from_secs(5)))
        };
        std::thread::sleep(Duration::from_millis(20));
        controls.arm_trigger();
        assert!(waiter.join().unwrap());
    }

    #[test]
    fn shutdown_raises_both_flags() {
        let controls = Controls::new();
        controls.request_shutdown();
        assert!(controls.is_cancelled());
        assert!(controls.force_return_requested());
    }

    #[test]
    fn shutdown_flags_are_one_shot() {
        let controls = Controls::new();
        controls.raise_shutdown_flags();
        controls.disarm_trigger();
        assert!(controls.is_cancelled());
    }
}
