//! The task status atom (spec §3, §4.1, §8 "Status monotonicity").

use std::sync::atomic::{AtomicU8, Ordering};

/// `Running -> (Suspended <-> Running)* -> Finished`, never backwards out of
/// `Finished`. The only valid *external* transition is `Suspended ->
/// Running`, performed by a [`super::waker::Waker`]; `Running <-> Suspended`
/// is otherwise internal to the task's own poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Running = 0,
    Suspended = 1,
    Finished = 2,
}

impl Status {
    fn from_u8(v: u8) -> Status {
        match v {
            0 => Status::Running,
            1 => Status::Suspended,
            _ => Status::Finished,
        }
    }
}

/// Lock-free status cell. Transitions use release ordering; reads use
/// acquire, matching the discipline spec §4.1 prescribes.
#[derive(Debug)]
pub struct StatusCell(AtomicU8);

impl StatusCell {
    pub fn new() -> Self {
        StatusCell(AtomicU8::new(Status::Running as u8))
    }

    pub fn load(&self) -> Status {
        Status::from_u8(self.0.load(Ordering::Acquire))
    }

    pub fn store(&self, status: Status) {
        self.0.store(status as u8, Ordering::Release);
    }

    /// Running -> Suspended. Called by the task's own poll loop just before
    /// returning `Poll::Pending`.
    pub fn mark_suspended(&self) {
        self.0.store(Status::Suspended as u8, Ordering::Release);
    }

    /// Suspended -> Running, the one externally-triggered transition. Returns
    /// `true` if this call performed the transition (i.e. the task was
    /// actually Suspended), so a waker fired more than once for the same
    /// suspension can be told apart from the first.
    pub fn mark_running(&self) -> bool {
        self.0
            .compare_exchange(
                Status::Suspended as u8,
                Status::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    pub fn mark_finished(&self) {
        self.0.store(Status::Finished as u8, Ordering::Release);
    }

    pub fn is_finished(&self) -> bool {
        self.load() == Status::Finished
    }
}

impl Default for StatusCell {
    fn default() -> Self {
        Self::new()
    }
}
