//! Timer Service (spec §4.4): a deadline-ordered set of pending timers,
//! driven by a dedicated thread rather than a kernel timer primitive.
//!
//! §5 "Threads" explicitly allows the timer-service thread to be separate
//! from the reactor thread; this implementation takes that option, waking
//! via a condition variable bounded to the earliest deadline instead of
//! arming a kernel `timerfd`/`EVFILT_TIMER`. See `DESIGN.md` for the
//! grounding and tradeoff.

mod handle;
mod sleep;

pub use handle::Timer;
pub use sleep::{sleep, Sleep};

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

pub(crate) struct TimerEntry {
    seq: u64,
    current_deadline: Mutex<Instant>,
    cancelled: AtomicBool,
    callback: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

struct HeapItem {
    key: Instant,
    seq: u64,
    entry: Arc<TimerEntry>,
}

impl PartialEq for HeapItem {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.seq == other.seq
    }
}
impl Eq for HeapItem {}
impl PartialOrd for HeapItem {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for HeapItem {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Deadline ascending, FIFO (insertion order) tie-break (§4.4).
        (self.key, self.seq).cmp(&(other.key, other.seq))
    }
}

/// Deadline-ordered set of unfired timers, backed by a priority queue. A
/// single worker thread sleeps until the earliest deadline, fires every
/// timer whose deadline has passed (in deadline order), then re-arms for the
/// new head (§4.4 "Fire protocol").
pub struct TimerService {
    heap: Mutex<BinaryHeap<Reverse<HeapItem>>>,
    cond: Condvar,
    next_seq: AtomicU64,
    stop: AtomicBool,
    running: AtomicBool,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl TimerService {
    pub fn new() -> Arc<Self> {
        Arc::new(TimerService {
            heap: Mutex::new(BinaryHeap::new()),
            cond: Condvar::new(),
            next_seq: AtomicU64::new(0),
            stop: AtomicBool::new(false),
            running: AtomicBool::new(false),
            worker: Mutex::new(None),
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::AcqRel) {
            return;
        }
        let this = self.clone();
        let handle = std::thread::Builder::new()
            .name("timer-service".into())
            .spawn(move || this.run())
            .expect("failed to spawn timer service worker thread");
        *self.worker.lock() = Some(handle);
    }

    pub fn stop(self: &Arc<Self>) {
        if !self.running.swap(false, Ordering::AcqRel) {
            return;
        }
        self.stop.store(true, Ordering::Release);
        self.cond.notify_all();
        if let Some(handle) = self.worker.lock().take() {
            let _ = handle.join();
        }
    }

    /// Schedules `callback` to run after `duration`. Returns a [`Timer`]
    /// handle that can cancel or delay it (§4.4 `schedule`).
    pub fn schedule(
        self: &Arc<Self>,
        duration: Duration,
        callback: impl FnOnce() + Send + 'static,
    ) -> Timer {
        let deadline = Instant::now() + duration;
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let entry = Arc::new(TimerEntry {
            seq,
            current_deadline: Mutex::new(deadline),
            cancelled: AtomicBool::new(false),
            callback: Mutex::new(Some(Box::new(callback))),
        });
        {
            let mut heap = self.heap.lock();
            heap.push(Reverse(HeapItem {
                key: deadline,
                seq,
                entry: entry.clone(),
            }));
        }
        self.cond.notify_all();
        Timer::new(entry)
    }

    fn run(self: Arc<Self>) {
        let mut heap = self.heap.lock();
        loop {
            if self.stop.load(Ordering::Acquire) {
                return;
            }

            let now = Instant::now();
            let mut due = Vec::new();

            loop {
                let Some(Reverse(top)) = heap.peek() else {
                    break;
                };
                if top.entry.cancelled.load(Ordering::Acquire) {
                    heap.pop();
                    continue;
                }
                let current = *top.entry.current_deadline.lock();
                if current != top.key {
                    // Lazily re-insert at its (possibly delayed) deadline;
                    // `Timer::delay` never moves a deadline earlier, so
                    // this cannot un-stick an entry that truly belongs
                    // further back in the queue (§4.4 `delay`).
                    let Reverse(item) = heap.pop().unwrap();
                    heap.push(Reverse(HeapItem {
                        key: current,
                        seq: item.seq,
                        entry: item.entry,
                    }));
                    continue;
                }
                if current > now {
                    break;
                }
                let Reverse(item) = heap.pop().unwrap();
                due.push(item.entry);
            }

            let next_wait = heap.peek().map(|Reverse(top)| {
                (*top.entry.current_deadline.lock()).saturating_duration_since(Instant::now())
            });

            if !due.is_empty() {
                // Fire outside the lock so callbacks (which may call
                // `schedule` again) don't deadlock against it.
                parking_lot::MutexGuard::unlocked(&mut heap, || {
                    for entry in &due {
                        if let Some(cb) = entry.callback.lock().take() {
                            tracing::debug!(seq = entry.seq, "timer fired");
                            cb();
                        }
                    }
                });
                continue;
            }

            match next_wait {
                Some(wait) => {
                    self.cond.wait_for(&mut heap, wait);
                }
                None => {
                    self.cond.wait(&mut heap);
                }
            }
        }
    }
}
