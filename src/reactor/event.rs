//! The object stored in an [`super::dispatcher::EventDispatcher`] slot, and
//! the concrete readiness event built on top of it (spec §3 "Event", §4.5).

use std::sync::Mutex;
use std::task::Waker;

use super::dispatcher::Direction;

/// Fired by the reactor loop when the kernel reports the direction this
/// event was armed for. Implementations typically store a waker and invoke
/// it; TLS-style state machines may instead advance and re-register for the
/// next direction (§3 "Event").
pub trait Event: Send + Sync {
    fn handle_event(&self, direction: Direction);
}

/// The common case: a single slot holding the waker of whichever task is
/// currently suspended on this readiness direction. `net`'s socket futures
/// build one of these per pending read/write/accept/connect. Stores a plain
/// `std::task::Waker` — waking it re-enters this runtime's own vtable
/// (`task::waker::to_std`), so no separate path back to the task is needed.
#[derive(Default)]
pub struct ReadinessEvent {
    waker: Mutex<Option<Waker>>,
}

impl ReadinessEvent {
    pub fn new() -> Self {
        ReadinessEvent::default()
    }

    /// Stores the waker to invoke on the next `handle_event`. Overwrites any
    /// previous waker — an awaitable is suspended by exactly one task at a
    /// time (§4.5 "a single awaitable instance is awaited by exactly one
    /// task at a time").
    pub fn set_waker(&self, waker: Waker) {
        *self.waker.lock().unwrap() = Some(waker);
    }
}

impl Event for ReadinessEvent {
    fn handle_event(&self, _direction: Direction) {
        if let Some(waker) = self.waker.lock().unwrap().take() {
            waker.wake();
        }
    }
}
