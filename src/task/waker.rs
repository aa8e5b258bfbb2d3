//! Waker = weak task reference (+ implicit wake reason), per spec §3.
//!
//! This doubles as the `std::task::Waker` our executor hands to polled
//! futures: `to_std` builds a standard library waker whose vtable routes
//! through the same `wake_up` path events and timers use.

use std::sync::Arc;
use std::task::{RawWaker, RawWakerVTable, Waker as StdWaker};

use super::header::WeakTask;

/// A weak task reference that can be invoked to resume its owner.
///
/// `wake_up` enqueues `(Resume, task)` on the task's bound scheduler; if the
/// task has expired the call is a no-op (§3 "Waker").
#[derive(Clone)]
pub struct Waker {
    weak: WeakTask,
}

impl Waker {
    pub fn new(weak: WeakTask) -> Self {
        Waker { weak }
    }

    pub fn weak(&self) -> WeakTask {
        self.weak.clone()
    }

    /// Transition the task Suspended -> Running and enqueue a Resume action
    /// on its bound scheduler. No-op if the task expired, was not actually
    /// Suspended (redundant wake), or has no bound scheduler.
    pub fn wake_up(&self) {
        let Some(task) = self.weak.upgrade() else {
            return;
        };
        if !task.status().mark_running() {
            // Redundant wake: another waker already performed the transition
            // and the resume is already queued or has already run.
            return;
        }
        let scheduler = task.scheduler_slot().lock().clone();
        if let Some(scheduler) = scheduler.and_then(|w| w.upgrade()) {
            scheduler.resume(Arc::downgrade(&task));
        }
    }

    /// Build a standard-library `Waker` that drives this task's future. Used
    /// internally by the scheduler's poll loop; exposed so custom
    /// `Awaitable` impls that need a raw `Context` can build one too.
    pub fn to_std(self) -> StdWaker {
        let raw = RawWaker::new(Box::into_raw(Box::new(self.weak)).cast(), &VTABLE);
        // Safety: the vtable functions below only ever operate on a
        // `Box<WeakTask>` pointer created the same way.
        unsafe { StdWaker::from_raw(raw) }
    }
}

static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, wake, wake_by_ref, drop_fn);

unsafe fn clone(ptr: *const ()) -> RawWaker {
    let weak = unsafe { &*ptr.cast::<WeakTask>() };
    let boxed = Box::new(weak.clone());
    RawWaker::new(Box::into_raw(boxed).cast(), &VTABLE)
}

unsafe fn wake(ptr: *const ()) {
    let weak = unsafe { *Box::from_raw(ptr.cast_mut().cast::<WeakTask>()) };
    Waker::new(weak).wake_up();
}

unsafe fn wake_by_ref(ptr: *const ()) {
    let weak = unsafe { &*ptr.cast::<WeakTask>() };
    Waker::new(weak.clone()).wake_up();
}

unsafe fn drop_fn(ptr: *const ()) {
    drop(unsafe { Box::from_raw(ptr.cast_mut().cast::<WeakTask>()) });
}
