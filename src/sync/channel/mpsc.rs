//! `MpscChannel` (spec §4.6): multi-producer, single-consumer, lock-free on
//! the send side.
//!
//! Grounded on `original_source/galay/kernel/concurrency/MpscChannel.h`,
//! which pairs a lock-free `moodycamel::ConcurrentQueue` with a bare `Waker`
//! woken only when the atomic size counter transitions 0 -> 1 — a window
//! where a consumer that has just observed `size == 0` but not yet stored its
//! waker misses the wakeup. §13 open question 2 resolves this to
//! register-then-recheck on the consumer side, which this module implements:
//! the data structure (`crossbeam_queue::SegQueue`, this crate's equivalent
//! of `moodycamel::ConcurrentQueue`) is unchanged, only the handshake is.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll, Waker};

use crossbeam_queue::SegQueue;
use parking_lot::Mutex;

/// Cloneable producer handle; `recv` lives on [`Channel`] directly since
/// only one consumer is supported.
pub struct Sender<T> {
    channel: std::sync::Arc<Channel<T>>,
}

impl<T> Clone for Sender<T> {
    fn clone(&self) -> Self {
        Sender {
            channel: self.channel.clone(),
        }
    }
}

impl<T> Sender<T> {
    pub fn send(&self, value: T) {
        self.channel.send(value);
    }
}

pub struct Channel<T> {
    queue: SegQueue<T>,
    len: AtomicUsize,
    waker: Mutex<Option<Waker>>,
}

/// Returns a `(Sender, Arc<Channel>)` pair; the channel itself is the
/// receiver, cloned `Sender`s are the producer side (§4.6 `MpscChannel`).
pub fn channel<T>() -> (Sender<T>, std::sync::Arc<Channel<T>>) {
    let channel = std::sync::Arc::new(Channel {
        queue: SegQueue::new(),
        len: AtomicUsize::new(0),
        waker: Mutex::new(None),
    });
    (
        Sender {
            channel: channel.clone(),
        },
        channel,
    )
}

impl<T> Channel<T> {
    pub fn send(&self, value: T) {
        self.queue.push(value);
        self.len.fetch_add(1, Ordering::AcqRel);
        if let Some(w) = self.waker.lock().take() {
            w.wake();
        }
    }

    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn recv(&self) -> Recv<'_, T> {
        Recv { channel: self }
    }
}

pub struct Recv<'a, T> {
    channel: &'a Channel<T>,
}

impl<'a, T> Future for Recv<'a, T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        if let Some(value) = self.try_pop() {
            return Poll::Ready(value);
        }
        *self.channel.waker.lock() = Some(cx.waker().clone());
        // Recheck after registering: a producer may have pushed and seen no
        // waker to wake in the gap between our first pop attempt and storing
        // this one (§13 open question 2).
        if let Some(value) = self.try_pop() {
            *self.channel.waker.lock() = None;
            return Poll::Ready(value);
        }
        Poll::Pending
    }
}

impl<'a, T> Recv<'a, T> {
    fn try_pop(&self) -> Option<T> {
        let value = self.channel.queue.pop()?;
        self.channel.len.fetch_sub(1, Ordering::AcqRel);
        Some(value)
    }
}
