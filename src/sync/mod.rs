//! Composition primitives (spec §4.6): mutex, one-shot waiters, races, and
//! channels, all built on the task/scheduler/timer layers rather than on
//! kernel primitives.

pub mod channel;
mod limit_waiter;
mod mutex;
mod timeout;
mod waiter;

pub use channel::{AsyncQueue, MpscChannel, UnsafeChannel};
pub use limit_waiter::LimitWaiter;
pub use mutex::{AsyncMutex, MutexGuard};
pub use timeout::{timeout, Elapsed};
pub use waiter::AsyncWaiter;
