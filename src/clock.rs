use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

/// How a wait ended. Callers must branch on this (or re-check
/// `is_cancelled`) immediately after every wait; that check-after-wait is
/// the whole cancellation contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Elapsed,
    Cancelled,
}

struct Flag {
    cancelled: Mutex<bool>,
    bell: Condvar,
}

/// Cloneable handle for cancelling a run from outside the solving thread
/// (an input loop, a ctrl-c handler). Cancelling is idempotent; it wakes
/// any in-flight wait and makes all later waits return immediately until
/// the owning clock is reset.
#[derive(Clone)]
pub struct CancelToken {
    flag: Arc<Flag>,
}

impl CancelToken {
    pub fn cancel(&self) {
        let mut cancelled = self.flag.cancelled.lock().unwrap();
        *cancelled = true;
        self.flag.bell.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.flag.cancelled.lock().unwrap()
    }
}

/// The pacing primitive that gates every visualized step: an interruptible
/// sleep. One clock serves one run at a time; the run loop is the only
/// waiter, so there is never more than one wait in flight.
pub struct StepClock {
    flag: Arc<Flag>,
}

impl StepClock {
    pub fn new() -> Self {
        StepClock {
            flag: Arc::new(Flag {
                cancelled: Mutex::new(false),
                bell: Condvar::new(),
            }),
        }
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            flag: Arc::clone(&self.flag),
        }
    }

    pub fn cancel(&self) {
        self.token().cancel()
    }

    pub fn is_cancelled(&self) -> bool {
        *self.flag.cancelled.lock().unwrap()
    }

    /// Clears cancellation so the clock can pace a new run.
    pub fn reset(&self) {
        *self.flag.cancelled.lock().unwrap() = false;
    }

    /// Block for `duration`, or less if cancelled mid-wait. A zero duration
    /// never sleeps but still reports cancellation, so delay-0 runs hit the
    /// same check-after-wait points as paced ones.
    pub fn wait(&self, duration: Duration) -> WaitOutcome {
        let cancelled = self.flag.cancelled.lock().unwrap();
        if *cancelled {
            return WaitOutcome::Cancelled;
        }
        if duration.is_zero() {
            return WaitOutcome::Elapsed;
        }
        let (cancelled, _) = self
            .flag
            .bell
            .wait_timeout_while(cancelled, duration, |c| !*c)
            .unwrap();
        if *cancelled {
            WaitOutcome::Cancelled
        } else {
            WaitOutcome::Elapsed
        }
    }
}

impl Default for StepClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_zero_wait_elapses() {
        let clock = StepClock::new();
        assert_eq!(clock.wait(Duration::ZERO), WaitOutcome::Elapsed);
    }

    #[test]
    fn test_short_wait_elapses() {
        let clock = StepClock::new();
        assert_eq!(clock.wait(Duration::from_millis(1)), WaitOutcome::Elapsed);
    }

    #[test]
    fn test_cancel_before_wait() {
        let clock = StepClock::new();
        clock.cancel();
        assert_eq!(clock.wait(Duration::ZERO), WaitOutcome::Cancelled);
        assert_eq!(clock.wait(Duration::from_secs(60)), WaitOutcome::Cancelled);
    }

    #[test]
    fn test_cancel_interrupts_inflight_wait() {
        let clock = StepClock::new();
        let token = clock.token();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            token.cancel();
        });
        let started = Instant::now();
        let outcome = clock.wait(Duration::from_secs(30));
        assert_eq!(outcome, WaitOutcome::Cancelled);
        assert!(started.elapsed() < Duration::from_secs(10));
        handle.join().unwrap();
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let clock = StepClock::new();
        clock.cancel();
        clock.cancel();
        clock.token().cancel();
        assert!(clock.is_cancelled());
    }

    #[test]
    fn test_reset_clears_cancellation() {
        let clock = StepClock::new();
        clock.cancel();
        assert_eq!(clock.wait(Duration::ZERO), WaitOutcome::Cancelled);
        clock.reset();
        assert!(!clock.is_cancelled());
        assert_eq!(clock.wait(Duration::ZERO), WaitOutcome::Elapsed);
    }
}
