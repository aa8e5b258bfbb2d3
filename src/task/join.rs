//! Concrete task storage and the public `Task<T>` / `JoinHandle<T>` surface
//! (spec §3 "Task", §4.1).

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use crate::scheduler::TaskScheduler;

use super::header::{bind_scheduler, drain_defer_stack, DeferCallback, TaskErased, WeakTask};
use super::status::{Status, StatusCell};
use super::waker::Waker;

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

struct TaskInner<T> {
    status: StatusCell,
    scheduler: Mutex<Option<Weak<TaskScheduler>>>,
    defer_stack: Mutex<Vec<DeferCallback>>,
    future: Mutex<Option<BoxFuture<T>>>,
    result: Mutex<Option<T>>,
    /// Single wait()-er, per §4.1 "only one waiter per target".
    waiter: Mutex<Option<std::task::Waker>>,
    self_weak: OnceCell<WeakTask>,
}

impl<T: Send + 'static> TaskErased for TaskInner<T> {
    fn status(&self) -> &StatusCell {
        &self.status
    }

    fn scheduler_slot(&self) -> &Mutex<Option<Weak<TaskScheduler>>> {
        &self.scheduler
    }

    fn defer(&self, cb: DeferCallback) {
        self.defer_stack.lock().push(cb);
    }

    fn poll_once(self: Arc<Self>) {
        let mut future_slot = self.future.lock();
        let Some(mut fut) = future_slot.take() else {
            // Already finished/destroyed; a stray Resume raced with
            // completion. No-op, matches "schedule(t); cancel(t); schedule(t)"
            // idempotence in §8.
            return;
        };

        // Park before polling, not after: `Waker::wake_up` only enqueues a
        // Resume if it can CAS Suspended -> Running, so a wake that fires
        // synchronously out of this very poll (e.g. `yield_now`'s
        // `wake_by_ref`, or a reactor/timer thread racing the return of
        // `poll`) must see Suspended *during* the poll call, or it is
        // dropped as a "redundant" wake and the task parks with no Resume
        // ever queued. Marking suspended up front means such a wake always
        // lands on the correct CAS and the Resume it queues simply races
        // harmlessly with this poll's own Pending/Ready outcome.
        self.status.mark_suspended();

        let weak = self
            .self_weak
            .get()
            .expect("task polled before self_weak was published")
            .clone();
        let std_waker = Waker::new(weak).to_std();
        let mut cx = Context::from_waker(&std_waker);

        match fut.as_mut().poll(&mut cx) {
            Poll::Pending => {
                *future_slot = Some(fut);
            }
            Poll::Ready(value) => {
                drop(future_slot);
                *self.result.lock() = Some(value);
                self.status.mark_finished();
                let weak = self.self_weak.get().unwrap().clone();
                drain_defer_stack(&mut self.defer_stack.lock(), &weak);
                if let Some(w) = self.waiter.lock().take() {
                    w.wake();
                }
            }
        }
    }

    fn destroy(self: Arc<Self>) {
        // Dropping the future without polling it again; its captured guards
        // (sockets, file handles, ...) release through their own Drop impls.
        let _ = self.future.lock().take();
        self.status.mark_finished();
        let weak = self.self_weak.get().unwrap().clone();
        drain_defer_stack(&mut self.defer_stack.lock(), &weak);
        if let Some(w) = self.waiter.lock().take() {
            w.wake();
        }
    }
}

/// A spawned task's shared handle. Cloning shares ownership; [`Task::weak`]
/// produces the weak observer form other components hold (§3 "identity =
/// stable address; always owned by exactly one shared owner").
pub struct Task<T> {
    inner: Arc<TaskInner<T>>,
}

impl<T> Clone for Task<T> {
    fn clone(&self) -> Self {
        Task {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Send + 'static> Task<T> {
    pub fn weak(&self) -> WeakTask {
        self.inner.self_weak.get().unwrap().clone()
    }

    pub fn status(&self) -> Status {
        self.inner.status.load()
    }

    pub fn is_finished(&self) -> bool {
        self.inner.status.is_finished()
    }

    /// Push a callback to run, in LIFO order with earlier defers, once this
    /// task reaches `Finished` and before it is dropped (§4.1 `defer`).
    pub fn defer(&self, cb: impl FnOnce(WeakTask) + Send + 'static) {
        self.inner.defer_stack.lock().push(Box::new(cb));
    }

    /// Take the result out, if the task has finished and it has not already
    /// been taken.
    pub fn take_result(&self) -> Option<T> {
        self.inner.result.lock().take()
    }

    /// An awaitable that suspends until this task is `Finished`, then yields
    /// its result (§4.1 "Wait-for-result awaitable"). Only one outstanding
    /// `join()` per task is supported; a second concurrent call will replace
    /// the first's waker, which only the latest caller will observe waking.
    pub fn join(&self) -> Join<T> {
        Join {
            inner: self.inner.clone(),
        }
    }
}

pub struct Join<T> {
    inner: Arc<TaskInner<T>>,
}

impl<T: Send + 'static> Future for Join<T> {
    type Output = Option<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.inner.status.is_finished() {
            return Poll::Ready(self.inner.result.lock().take());
        }
        *self.inner.waiter.lock() = Some(cx.waker().clone());
        // Re-check after registering to close the same race the mpsc
        // channel must close (§13 open question 2): the task may have
        // finished between the check above and the registration.
        if self.inner.status.is_finished() {
            return Poll::Ready(self.inner.result.lock().take());
        }
        Poll::Pending
    }
}

/// Wrap a future into a new `Task`. The task starts `Running` but is not yet
/// bound to any scheduler or dispatched; call [`crate::runtime::Runtime::schedule`]
/// (or a `TaskScheduler` directly) to submit it.
pub fn create<F, T>(future: F) -> Task<T>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let inner = Arc::new(TaskInner {
        status: StatusCell::new(),
        scheduler: Mutex::new(None),
        defer_stack: Mutex::new(Vec::new()),
        future: Mutex::new(Some(Box::pin(future))),
        result: Mutex::new(None),
        waiter: Mutex::new(None),
        self_weak: OnceCell::new(),
    });
    let erased: Arc<dyn TaskErased> = inner.clone();
    let _ = inner.self_weak.set(Arc::downgrade(&erased));
    Task { inner }
}

/// Binds `task`'s scheduler slot, used by [`TaskScheduler::schedule`] and
/// [`crate::runtime::Runtime::schedule`] before the first enqueue.
pub fn bind<T: Send + 'static>(task: &Task<T>, scheduler: &Arc<TaskScheduler>) {
    bind_scheduler(&*task.inner, scheduler);
}
