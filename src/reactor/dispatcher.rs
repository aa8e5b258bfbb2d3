//! Per-descriptor dispatcher (spec §3 "EventDispatcher", §4.3).
//!
//! At most one [`Event`] may be armed per direction per descriptor at any
//! instant; the bitset and the slot are kept consistent under a single lock
//! (the teacher's `reactor.rs` already guards its waker slab the same way
//! with `parking_lot::Mutex`, rather than hand-rolled atomics).

use std::sync::Arc;

use bitflags::bitflags;
use parking_lot::Mutex;

use super::event::Event;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Direction: u8 {
        const READ  = 0b001;
        const WRITE = 0b010;
        const ERROR = 0b100;
    }
}

#[derive(Default)]
struct Slots {
    registered: Direction,
    read: Option<Arc<dyn Event>>,
    write: Option<Arc<dyn Event>>,
    error: Option<Arc<dyn Event>>,
}

impl Default for Direction {
    fn default() -> Self {
        Direction::empty()
    }
}

/// Owns the (at most) one armed event per direction for a single descriptor.
pub struct EventDispatcher {
    slots: Mutex<Slots>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        EventDispatcher {
            slots: Mutex::new(Slots::default()),
        }
    }

    pub fn registered(&self) -> Direction {
        self.slots.lock().registered
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().registered.is_empty()
    }

    /// Arms `event` for `direction`. Returns `Err` if that direction is
    /// already occupied (spec §4.3 requires the stricter variant, not silent
    /// replacement).
    pub fn arm(&self, direction: Direction, event: Arc<dyn Event>) -> Result<(), ()> {
        let mut slots = self.slots.lock();
        if slots.registered.contains(direction) {
            return Err(());
        }
        match direction {
            Direction::READ => slots.read = Some(event),
            Direction::WRITE => slots.write = Some(event),
            Direction::ERROR => slots.error = Some(event),
            _ => return Err(()),
        }
        slots.registered.insert(direction);
        Ok(())
    }

    /// Clears the slot for `direction`, if any. Safe to call from any
    /// thread; once this returns, the reactor loop will not dispatch to the
    /// event that was there (§4.3 `cancelEvent`).
    pub fn clear(&self, direction: Direction) -> Option<Arc<dyn Event>> {
        let mut slots = self.slots.lock();
        slots.registered.remove(direction);
        match direction {
            Direction::READ => slots.read.take(),
            Direction::WRITE => slots.write.take(),
            Direction::ERROR => slots.error.take(),
            _ => None,
        }
    }

    /// Atomically clears and returns the slot for `direction` if it is
    /// currently registered, so the reactor loop can dispatch without racing
    /// a concurrent cancel (clear-before-dispatch, §4.3 main loop step 3).
    pub fn take_for_dispatch(&self, direction: Direction) -> Option<Arc<dyn Event>> {
        self.clear(direction)
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
