//! The coroutine/task subsystem (spec §4.1).
//!
//! Rust has no native stackful coroutine; a `Task<T>` is a boxed `Future`
//! driven by our own poll loop, wrapped the idiomatic way behind a
//! `RawWaker` vtable so the rest of the runtime (reactor, timers) can treat
//! it exactly like the spec's Task/Waker pair.

mod header;
mod join;
mod status;
mod waker;

pub use header::{DeferCallback, TaskErased, WeakTask};
pub use join::{create, Join, Task};
pub use status::{Status, StatusCell};
pub use waker::Waker;

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Cooperative reschedule on the same scheduler (spec §4.1 `yield`):
/// suspends once, immediately re-wakes itself, then completes on the next
/// poll. Equivalent to an awaitable whose `ready()` is true with a policy bit
/// requesting requeue.
pub fn yield_now() -> YieldNow {
    YieldNow { yielded: false }
}

pub struct YieldNow {
    yielded: bool,
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            return Poll::Ready(());
        }
        self.yielded = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}
