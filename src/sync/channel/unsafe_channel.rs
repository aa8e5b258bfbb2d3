//! `UnsafeChannel` (spec §4.6): a single-consumer queue with no cross-thread
//! guarantees, grounded on
//! `original_source/galay/kernel/concurrency/UnsafeChannel.h` — intended for
//! tasks pinned to the same scheduler thread, where a plain queue and a
//! single waker slot are enough.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, Waker};

/// Not `Sync`: sharing across scheduler threads requires `mpsc::Channel`
/// instead. Send and receive on the same task/thread only.
pub struct UnsafeChannel<T> {
    queue: RefCell<VecDeque<T>>,
    waker: RefCell<Option<Waker>>,
}

impl<T> UnsafeChannel<T> {
    pub fn new() -> Self {
        UnsafeChannel {
            queue: RefCell::new(VecDeque::new()),
            waker: RefCell::new(None),
        }
    }

    pub fn send(&self, value: T) {
        self.queue.borrow_mut().push_back(value);
        if let Some(w) = self.waker.borrow_mut().take() {
            w.wake();
        }
    }

    pub fn send_batch(&self, values: impl IntoIterator<Item = T>) {
        self.queue.borrow_mut().extend(values);
        if let Some(w) = self.waker.borrow_mut().take() {
            w.wake();
        }
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    pub fn recv(&self) -> Recv<'_, T> {
        Recv { channel: self }
    }

    /// Drains everything currently queued without suspending, even if empty
    /// (§4.6 "recvBatch").
    pub fn recv_batch(&self) -> Vec<T> {
        self.queue.borrow_mut().drain(..).collect()
    }
}

impl<T> Default for UnsafeChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Recv<'a, T> {
    channel: &'a UnsafeChannel<T>,
}

impl<'a, T> Future for Recv<'a, T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        if let Some(value) = self.channel.queue.borrow_mut().pop_front() {
            return Poll::Ready(value);
        }
        *self.channel.waker.borrow_mut() = Some(cx.waker().clone());
        if let Some(value) = self.channel.queue.borrow_mut().pop_front() {
            *self.channel.waker.borrow_mut() = None;
            return Poll::Ready(value);
        }
        Poll::Pending
    }
}
