//! A coroutine-style asynchronous I/O runtime: task scheduler, readiness
//! reactor (epoll/kqueue via `mio`, optionally `io_uring`), timer service,
//! and the composition primitives built on them (mutex, waiters, channels,
//! timeout).
//!
//! The pieces compose through [`runtime::Runtime`]: construct one from a
//! [`config::RuntimeConfig`], `start()` it, `schedule()` tasks created with
//! [`task::create`], and `stop()` it when done.

pub mod config;
pub mod error;
pub mod fs;
pub mod liveness;
pub mod logging;
pub mod net;
pub mod reactor;
pub mod runtime;
pub mod scheduler;
pub mod sync;
pub mod task;
pub mod timer;

pub use config::RuntimeConfig;
pub use error::{Error, Result};
pub use runtime::{Runtime, RuntimeHandle};
