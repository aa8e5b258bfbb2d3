//! `LimitWaiter<T, E>` (spec §4.6): like [`AsyncWaiter`], but the winning
//! `notify` also cancels every appended child — the primitive `timeout()`
//! is built from.
//!
//! Grounded on `original_source/galay/kernel/coroutine/LimitWaiter.hpp`'s
//! `destroyTasks()`, which unconditionally destroys every appended task when
//! `notify` fires, including one that happens to be the caller of `notify`
//! itself. That is safe here because cancellation is routed through
//! `TaskScheduler::destroy`, which only ever runs on the scheduler's own
//! worker thread and only after the in-progress `poll_once` that called
//! `notify` has returned and released the task's future lock — never inline.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker as StdWaker};

use parking_lot::Mutex;

use crate::scheduler::TaskScheduler;
use crate::task::{Task, WeakTask};

use super::waiter::PendingChild;

struct State<T, E> {
    result: Option<Result<T, E>>,
    waker: Option<StdWaker>,
    children: Vec<PendingChild>,
    spawned: bool,
}

/// A race between N child tasks: the first to call `notify` wins, and every
/// other appended child is cancelled. Used to implement `timeout()` (§4.5)
/// as a race between the timer and the operation under watch.
pub struct LimitWaiter<T, E> {
    state: Mutex<State<T, E>>,
}

impl<T: Send + 'static, E: Send + 'static> LimitWaiter<T, E> {
    pub fn new() -> Self {
        LimitWaiter {
            state: Mutex::new(State {
                result: None,
                waker: None,
                children: Vec::new(),
                spawned: false,
            }),
        }
    }

    pub fn append_task<C: Send + 'static>(&self, task: &Task<C>, scheduler: &Arc<TaskScheduler>) {
        self.state.lock().children.push(PendingChild {
            weak: task.weak(),
            scheduler: scheduler.clone(),
        });
    }

    /// Wakes the waiter at most once, and destroys every appended child
    /// (`destroyTasks`) on the call that wins (§4.6 `notify`).
    pub fn notify(&self, value: Result<T, E>) -> bool {
        let mut state = self.state.lock();
        if state.result.is_some() {
            return false;
        }
        state.result = Some(value);
        let waker = state.waker.take();
        let children = std::mem::take(&mut state.children);
        drop(state);
        for child in children {
            child.scheduler.destroy(child.weak);
        }
        if let Some(w) = waker {
            w.wake();
        }
        true
    }

    pub fn wait(&self) -> Wait<'_, T, E> {
        Wait { waiter: self }
    }
}

impl<T: Send + 'static, E: Send + 'static> Default for LimitWaiter<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Wait<'a, T, E> {
    waiter: &'a LimitWaiter<T, E>,
}

impl<'a, T: Send + 'static, E: Send + 'static> Future for Wait<'a, T, E> {
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.waiter.state.lock();
        if let Some(result) = state.result.take() {
            return Poll::Ready(result);
        }
        if !state.spawned {
            state.spawned = true;
            let children = std::mem::take(&mut state.children);
            drop(state);
            for child in children {
                child.scheduler.resume(child.weak);
            }
            state = self.waiter.state.lock();
            if let Some(result) = state.result.take() {
                return Poll::Ready(result);
            }
        }
        state.waker = Some(cx.waker().clone());
        Poll::Pending
    }
}
