//! `AsyncWaiter<T, E>` (spec §4.6): one-shot notification with a result slot
//! and a set of child tasks scheduled at the moment `wait()` is first polled.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker as StdWaker};

use parking_lot::Mutex;

use crate::scheduler::TaskScheduler;
use crate::task::{Task, WeakTask};

pub(crate) struct PendingChild {
    pub(crate) weak: WeakTask,
    pub(crate) scheduler: Arc<TaskScheduler>,
}

struct State<T, E> {
    result: Option<Result<T, E>>,
    waker: Option<StdWaker>,
    children: Vec<PendingChild>,
}

/// Wakes at most one waiter, exactly once (`notify` is a winning CAS), after
/// running the child tasks appended via [`AsyncWaiter::append_task`]
/// concurrently with the wait.
pub struct AsyncWaiter<T, E> {
    state: Mutex<State<T, E>>,
}

impl<T: Send + 'static, E: Send + 'static> AsyncWaiter<T, E> {
    pub fn new() -> Self {
        AsyncWaiter {
            state: Mutex::new(State {
                result: None,
                waker: None,
                children: Vec::new(),
            }),
        }
    }

    /// Registers `task` to be scheduled on `scheduler` once `wait()` is first
    /// awaited — it then runs concurrently with the waiter (§4.6
    /// `appendTask`).
    pub fn append_task<C: Send + 'static>(&self, task: &Task<C>, scheduler: &Arc<TaskScheduler>) {
        self.state.lock().children.push(PendingChild {
            weak: task.weak(),
            scheduler: scheduler.clone(),
        });
    }

    /// Wakes the waiter at most once. Returns `true` iff this call won the
    /// race (§4.6 `notify`).
    pub fn notify(&self, value: Result<T, E>) -> bool {
        let mut state = self.state.lock();
        if state.result.is_some() {
            return false;
        }
        state.result = Some(value);
        let waker = state.waker.take();
        drop(state);
        if let Some(w) = waker {
            w.wake();
        }
        true
    }

    pub fn wait(&self) -> Wait<'_, T, E> {
        Wait {
            waiter: self,
            spawned: false,
        }
    }
}

impl<T: Send + 'static, E: Send + 'static> Default for AsyncWaiter<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Wait<'a, T, E> {
    waiter: &'a AsyncWaiter<T, E>,
    spawned: bool,
}

impl<'a, T: Send + 'static, E: Send + 'static> Future for Wait<'a, T, E> {
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let mut state = this.waiter.state.lock();
        if let Some(result) = state.result.take() {
            return Poll::Ready(result);
        }
        if !this.spawned {
            this.spawned = true;
            let children = std::mem::take(&mut state.children);
            drop(state);
            for child in children {
                child.scheduler.resume(child.weak);
            }
            // Re-lock and recheck: a child may have notified already, in the
            // gap between spawning it and registering our waker (closes the
            // same race class as §13 open question 2).
            state = this.waiter.state.lock();
            if let Some(result) = state.result.take() {
                return Poll::Ready(result);
            }
        }
        state.waker = Some(cx.waker().clone());
        Poll::Pending
    }
}
