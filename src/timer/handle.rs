//! Public timer handle (spec §4.4).

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::TimerEntry;

/// A handle to a scheduled, possibly already-fired timer. Weakly held: the
/// timer fires even if every `Timer` handle to it is dropped, since the
/// callback was captured at `schedule` time.
#[derive(Clone)]
pub struct Timer {
    entry: Arc<TimerEntry>,
}

impl Timer {
    pub(super) fn new(entry: Arc<TimerEntry>) -> Self {
        Timer { entry }
    }

    /// Idempotent, O(1). A cancelled timer that reaches the head of the
    /// queue is silently dropped on fire (§4.4).
    pub fn cancel(&self) {
        self.entry.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.entry.cancelled.load(Ordering::Acquire)
    }

    /// Requests a new deadline at least `duration` from now. Applied lazily:
    /// the timer's position in the queue is not updated until the service
    /// next observes it at the head (§4.4 `delay`).
    pub fn delay(&self, duration: Duration) {
        let mut deadline = self.entry.current_deadline.lock();
        let candidate = Instant::now() + duration;
        if candidate > *deadline {
            *deadline = candidate;
        }
    }

    /// Current time-until-deadline; never negative.
    pub fn remaining(&self) -> Duration {
        self.entry
            .current_deadline
            .lock()
            .saturating_duration_since(Instant::now())
    }
}
