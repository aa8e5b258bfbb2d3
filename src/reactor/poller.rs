//! Poller — thin wrapper around `mio::Poll`, which itself selects epoll on
//! Linux and kqueue on BSD/macOS (spec §4.3 "Registration backends"; the
//! `io_uring` backend is a separate, feature-gated proactor — see
//! `reactor::iouring`).

use std::io;
use std::time::Duration;

use mio::{Events, Poll, Registry};

/// Default cap on events drained per kernel readiness call (spec §4.3
/// `DEFAULT_MAX_EVENTS`). Larger means fewer syscalls at the cost of more
/// per-iteration memory.
pub const DEFAULT_MAX_EVENTS: usize = 1024;

pub struct Poller {
    poll: Poll,
    events: Events,
}

impl Poller {
    pub fn new(max_events: usize) -> io::Result<Self> {
        Ok(Poller {
            poll: Poll::new()?,
            events: Events::with_capacity(max_events),
        })
    }

    pub fn registry(&self) -> &Registry {
        self.poll.registry()
    }

    /// Blocks in the kernel readiness call for at most `timeout`, then hands
    /// the resulting events to `visit`. Returns `Ok(true)` if the call should
    /// be retried immediately (EINTR/EAGAIN, spec §4.3 "continue"), `Ok(false)`
    /// on a normal return, and `Err` for any other failure.
    pub fn poll(
        &mut self,
        timeout: Option<Duration>,
        mut visit: impl FnMut(&mio::event::Event),
    ) -> io::Result<bool> {
        match self.poll.poll(&mut self.events, timeout) {
            Ok(()) => {
                for event in self.events.iter() {
                    visit(event);
                }
                Ok(false)
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(true),
            Err(e) => Err(e),
        }
    }
}
