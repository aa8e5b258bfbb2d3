//! `AsyncMutex` (spec §4.6): ownership lock with a FIFO waiter queue.
//!
//! The teacher's original (`original_source/galay/concurrency/AsyncMutex.h`)
//! queues raw `Waker`s in a lock-free `moodycamel::ConcurrentQueue` and
//! separately CASes an atomic `locked` bool, which is exactly the
//! "wake-after-enqueue" race class flagged in §13 open question 2 for the
//! mpsc channel. Rather than reproduce that hazard here, `locked` and the
//! waiter queue share one `parking_lot::Mutex`, so acquire/release/enqueue
//! are a single atomic step. The public contract (FIFO fairness, lock taken
//! synchronously when free) is unchanged.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, Waker};

use parking_lot::Mutex as SyncMutex;

struct Inner {
    locked: bool,
    waiters: VecDeque<Waker>,
}

pub struct AsyncMutex {
    inner: SyncMutex<Inner>,
}

impl AsyncMutex {
    pub fn new() -> Self {
        AsyncMutex {
            inner: SyncMutex::new(Inner {
                locked: false,
                waiters: VecDeque::new(),
            }),
        }
    }

    pub fn is_locked(&self) -> bool {
        self.inner.lock().locked
    }

    /// Returns an awaitable: taken synchronously if free, otherwise the
    /// caller's waker is queued and the task suspends (§4.6 `lock`).
    pub fn lock(&self) -> Lock<'_> {
        Lock {
            mutex: self,
            queued: false,
        }
    }

    /// Pops one waker and invokes it (ownership transfers directly to it,
    /// without ever observing `locked == false` in between, so no third
    /// arrival can steal the lock out of FIFO order). If no one is waiting,
    /// the lock becomes free (§4.6 `unlock`, §8 scenario 3).
    fn unlock(&self) {
        let mut inner = self.inner.lock();
        match inner.waiters.pop_front() {
            Some(waker) => {
                drop(inner);
                waker.wake();
            }
            None => inner.locked = false,
        }
    }
}

impl Default for AsyncMutex {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Lock<'a> {
    mutex: &'a AsyncMutex,
    queued: bool,
}

impl<'a> Future for Lock<'a> {
    type Output = MutexGuard<'a>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let mut inner = this.mutex.inner.lock();
        if this.queued {
            // Only reachable once `unlock` has handed ownership to us.
            return Poll::Ready(MutexGuard { mutex: this.mutex });
        }
        if !inner.locked {
            inner.locked = true;
            return Poll::Ready(MutexGuard { mutex: this.mutex });
        }
        inner.waiters.push_back(cx.waker().clone());
        this.queued = true;
        Poll::Pending
    }
}

/// Dropping the guard releases the mutex, giving scoped-acquisition release
/// semantics on every exit path (§5 "Resource release").
pub struct MutexGuard<'a> {
    mutex: &'a AsyncMutex,
}

impl Drop for MutexGuard<'_> {
    fn drop(&mut self) {
        self.mutex.unlock();
    }
}
