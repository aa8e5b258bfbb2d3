//! `AsyncQueue<T>` (spec §4.6, §12 supplemented): a bounded, multi-producer
//! multi-consumer queue.
//!
//! Grounded on `original_source/galay/kernel/coroutine/AsyncQueue.h`, which
//! pairs a lock-free queue with a FIFO list of waiting consumers (`onReady`
//! tries a dequeue without suspending; `onSuspend` rechecks once more before
//! registering). This version adds a capacity bound the original does not
//! have — `send` suspends symmetrically when full, woken by a consumer's
//! dequeue, rather than growing without limit.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, Waker};

use parking_lot::Mutex;

struct Inner<T> {
    items: VecDeque<T>,
    capacity: usize,
    recv_waiters: VecDeque<Waker>,
    send_waiters: VecDeque<Waker>,
}

/// A bounded FIFO queue shared by any number of producers and consumers.
pub struct AsyncQueue<T> {
    inner: Mutex<Inner<T>>,
}

impl<T> AsyncQueue<T> {
    pub fn new(capacity: usize) -> Self {
        AsyncQueue {
            inner: Mutex::new(Inner {
                items: VecDeque::new(),
                capacity,
                recv_waiters: VecDeque::new(),
                send_waiters: VecDeque::new(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        let inner = self.inner.lock();
        inner.items.len() >= inner.capacity
    }

    /// Enqueues immediately, without suspending, if there is room.
    pub fn try_send(&self, value: T) -> Result<(), T> {
        let mut inner = self.inner.lock();
        if inner.items.len() >= inner.capacity {
            return Err(value);
        }
        inner.items.push_back(value);
        let waker = inner.recv_waiters.pop_front();
        drop(inner);
        if let Some(w) = waker {
            w.wake();
        }
        Ok(())
    }

    /// Dequeues immediately, without suspending, if something is queued.
    pub fn try_recv(&self) -> Option<T> {
        let mut inner = self.inner.lock();
        let value = inner.items.pop_front()?;
        let waker = inner.send_waiters.pop_front();
        drop(inner);
        if let Some(w) = waker {
            w.wake();
        }
        Some(value)
    }

    pub fn send(&self, value: T) -> Send<'_, T> {
        Send {
            queue: self,
            value: Some(value),
        }
    }

    pub fn recv(&self) -> Recv<'_, T> {
        Recv { queue: self }
    }
}

pub struct Send<'a, T> {
    queue: &'a AsyncQueue<T>,
    value: Option<T>,
}

impl<'a, T> Future for Send<'a, T> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();
        let value = this.value.take().expect("Send polled after completion");
        match this.queue.try_send(value) {
            Ok(()) => Poll::Ready(()),
            Err(value) => {
                let mut inner = this.queue.inner.lock();
                if inner.items.len() < inner.capacity {
                    // Room freed between the failed try_send and taking the
                    // lock again; recheck before suspending.
                    inner.items.push_back(value);
                    let waker = inner.recv_waiters.pop_front();
                    drop(inner);
                    if let Some(w) = waker {
                        w.wake();
                    }
                    return Poll::Ready(());
                }
                this.value = Some(value);
                inner.send_waiters.push_back(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

pub struct Recv<'a, T> {
    queue: &'a AsyncQueue<T>,
}

impl<'a, T> Future for Recv<'a, T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        if let Some(value) = self.queue.try_recv() {
            return Poll::Ready(value);
        }
        let mut inner = self.queue.inner.lock();
        if let Some(value) = inner.items.pop_front() {
            let waker = inner.send_waiters.pop_front();
            drop(inner);
            if let Some(w) = waker {
                w.wake();
            }
            return Poll::Ready(value);
        }
        inner.recv_waiters.push_back(cx.waker().clone());
        Poll::Pending
    }
}
