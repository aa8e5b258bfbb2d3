//! Event Reactor (spec §4.3): the readiness-driven event loop, its
//! dispatcher map, and the contract by which a suspended task is re-armed
//! when its descriptor becomes ready.

mod dispatcher;
mod event;
#[cfg(feature = "io_uring")]
pub mod iouring;
pub mod poller;

pub use dispatcher::{Direction, EventDispatcher};
pub use event::{Event, ReadinessEvent};

use std::collections::HashMap;
use std::io;
use std::os::unix::io::RawFd;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use mio::{Interest, Token};
use parking_lot::{Mutex, RwLock};

use crate::error::Error;
use poller::Poller;

const NOTIFY_TOKEN: Token = Token(usize::MAX);

/// One kernel-readiness loop. Owns a descriptor->dispatcher map (read-mostly
/// lock, §5 "Shared resources") and turns readiness into waker invocation.
pub struct EventReactor {
    poller: Mutex<Poller>,
    waker: mio::Waker,
    dispatchers: RwLock<HashMap<RawFd, Arc<EventDispatcher>>>,
    once_loop_cbs: Mutex<Vec<Box<dyn FnOnce() + Send>>>,
    stop_flag: AtomicBool,
    running: AtomicBool,
    last_error: Mutex<Option<io::Error>>,
    wait_cap: Duration,
}

impl EventReactor {
    pub fn new(max_events: usize, wait_cap: Duration) -> io::Result<Arc<Self>> {
        let poller = Poller::new(max_events)?;
        let waker = mio::Waker::new(poller.registry(), NOTIFY_TOKEN)?;
        Ok(Arc::new(EventReactor {
            poller: Mutex::new(poller),
            waker,
            dispatchers: RwLock::new(HashMap::new()),
            once_loop_cbs: Mutex::new(Vec::new()),
            stop_flag: AtomicBool::new(false),
            running: AtomicBool::new(false),
            last_error: Mutex::new(None),
            wait_cap,
        }))
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().as_ref().map(ToString::to_string)
    }

    /// Registers a fresh mio source and lazily creates its dispatcher entry.
    pub fn register_source<S: mio::event::Source>(
        &self,
        source: &mut S,
        fd: RawFd,
        interest: Interest,
    ) -> io::Result<()> {
        self.poller
            .lock()
            .registry()
            .register(source, Token(fd as usize), interest)?;
        self.dispatchers
            .write()
            .entry(fd)
            .or_insert_with(|| Arc::new(EventDispatcher::new()));
        Ok(())
    }

    /// Changes the interest set for an already-registered source (e.g. a TLS
    /// handshake flipping between `WANT_READ` and `WANT_WRITE`).
    pub fn reregister_source<S: mio::event::Source>(
        &self,
        source: &mut S,
        fd: RawFd,
        interest: Interest,
    ) -> io::Result<()> {
        self.poller
            .lock()
            .registry()
            .reregister(source, Token(fd as usize), interest)
    }

    /// Deregisters the source and drops its dispatcher entry. Descriptors
    /// are only removed from the map here, at close time (§4.3).
    pub fn deregister_source<S: mio::event::Source>(
        &self,
        source: &mut S,
        fd: RawFd,
    ) -> io::Result<()> {
        self.poller.lock().registry().deregister(source)?;
        self.dispatchers.write().remove(&fd);
        Ok(())
    }

    fn dispatcher(&self, fd: RawFd) -> Arc<EventDispatcher> {
        if let Some(d) = self.dispatchers.read().get(&fd) {
            return d.clone();
        }
        self.dispatchers
            .write()
            .entry(fd)
            .or_insert_with(|| Arc::new(EventDispatcher::new()))
            .clone()
    }

    /// Associates `event` with `fd`'s `direction`. Idempotent under "at most
    /// one event per direction"; returns [`Error::CallActiveEvent`] if the
    /// slot is already occupied (§4.3 armEvent — the stricter variant).
    pub fn arm_event(
        &self,
        fd: RawFd,
        direction: Direction,
        event: Arc<dyn Event>,
    ) -> Result<(), Error> {
        self.dispatcher(fd)
            .arm(direction, event)
            .map_err(|_| Error::CallActiveEvent(None))
    }

    /// Unregisters and clears the slot. Guaranteed that `handle_event` will
    /// not fire for this event after this returns (§4.3 `cancelEvent`).
    pub fn cancel_event(&self, fd: RawFd, direction: Direction) {
        if let Some(d) = self.dispatchers.read().get(&fd) {
            d.clear(direction);
        }
    }

    /// Wakes a blocked loop. Returns `true` if the wake was accepted.
    pub fn notify(&self) -> bool {
        self.waker.wake().is_ok()
    }

    /// Runs `cb` at the end of the current loop iteration.
    pub fn register_once_loop_callback(&self, cb: impl FnOnce() + Send + 'static) {
        self.once_loop_cbs.lock().push(Box::new(cb));
    }

    /// Runs the main loop on the calling thread. `timeout_hint` is typically
    /// supplied by the runtime from the timer service's next deadline.
    pub fn start(self: &Arc<Self>, mut timeout_hint: impl FnMut() -> Option<Duration>) {
        self.running.store(true, Ordering::Release);
        tracing::info!("event reactor starting");
        loop {
            if self.stop_flag.load(Ordering::Acquire) {
                break;
            }
            let timeout = match timeout_hint() {
                Some(d) => Some(d.min(self.wait_cap)),
                None => Some(self.wait_cap),
            };

            let dispatch_result = {
                let mut poller = self.poller.lock();
                poller.poll(timeout, |event| {
                    if event.token() == NOTIFY_TOKEN {
                        return;
                    }
                    let fd = event.token().0 as RawFd;
                    let Some(dispatcher) = self.dispatchers.read().get(&fd).cloned() else {
                        return;
                    };
                    let mut triggered = Direction::empty();
                    if event.is_readable() || event.is_read_closed() {
                        triggered.insert(Direction::READ);
                    }
                    if event.is_writable() || event.is_write_closed() {
                        triggered.insert(Direction::WRITE);
                    }
                    if event.is_error() {
                        triggered.insert(Direction::ERROR);
                    }
                    for direction in [Direction::READ, Direction::WRITE, Direction::ERROR] {
                        if triggered.contains(direction) {
                            if let Some(ev) = dispatcher.take_for_dispatch(direction) {
                                ev.handle_event(direction);
                            }
                        }
                    }
                })
            };

            match dispatch_result {
                Ok(_retry) => {}
                Err(e) => {
                    tracing::error!(error = %e, "event reactor poll failed");
                    *self.last_error.lock() = Some(e);
                    break;
                }
            }

            let callbacks: Vec<_> = std::mem::take(&mut *self.once_loop_cbs.lock());
            for cb in callbacks {
                cb();
            }

            if self.stop_flag.load(Ordering::Acquire) {
                break;
            }
        }
        self.running.store(false, Ordering::Release);
        tracing::info!("event reactor stopped");
    }

    /// Safe to call from any thread. Sets the stop flag and nudges the loop
    /// out of its blocking poll via `notify`.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Release);
        self.notify();
    }
}
