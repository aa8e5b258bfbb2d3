//! Liveness manager (spec §4.7, optional; supplemented from
//! `original_source/galay/kernel/runtime/Runtime.h`'s `CoroutineManager`):
//! two alternating queues and a phase bit, swept on an interval thread to
//! bound the lifetime of tasks that are otherwise only held by external weak
//! references.
//!
//! §13 resolution 3: a swept task is dropped from the live set iff its
//! status is `Finished` — a task merely unreachable except through a parked
//! event is never treated as expired here.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_queue::SegQueue;

use crate::task::{TaskErased, WeakTask};

/// Disabled by default (matches the original's `start_check = false`);
/// `RuntimeConfig` turns it on with an interval.
pub struct LivenessManager {
    interval: Duration,
    phase: AtomicBool,
    queue_a: SegQueue<WeakTask>,
    queue_b: SegQueue<WeakTask>,
    running: AtomicBool,
    worker: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl LivenessManager {
    pub fn new(interval: Duration) -> Arc<Self> {
        Arc::new(LivenessManager {
            interval,
            phase: AtomicBool::new(false),
            queue_a: SegQueue::new(),
            queue_b: SegQueue::new(),
            running: AtomicBool::new(false),
            worker: parking_lot::Mutex::new(None),
        })
    }

    /// Registers `task` with whichever queue the current phase designates as
    /// active (`CoroutineManager::manage`).
    pub fn manage(&self, task: WeakTask) {
        if !self.phase.load(Ordering::Acquire) {
            self.queue_a.push(task);
        } else {
            self.queue_b.push(task);
        }
    }

    pub fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::AcqRel) {
            return;
        }
        let this = self.clone();
        let handle = std::thread::Builder::new()
            .name("liveness-manager".into())
            .spawn(move || {
                while this.running.load(Ordering::Acquire) {
                    std::thread::sleep(this.interval);
                    this.sweep();
                }
            })
            .expect("failed to spawn liveness manager worker thread");
        *self.worker.lock() = Some(handle);
    }

    /// Flips the phase, then drains the queue that was active before the
    /// flip, forwarding every task that has not finished into the other
    /// queue (`CoroutineManager::autoCheck`).
    fn sweep(&self) {
        let was_b = self.phase.fetch_xor(true, Ordering::AcqRel);
        let (drain, forward) = if !was_b {
            (&self.queue_a, &self.queue_b)
        } else {
            (&self.queue_b, &self.queue_a)
        };
        while let Some(weak) = drain.pop() {
            if let Some(task) = weak.upgrade() {
                if !task.status().is_finished() {
                    forward.push(weak);
                }
            }
        }
    }

    /// Stops the sweep thread, then force-destroys every task still
    /// outstanding in either queue (`CoroutineManager::stop`), bypassing the
    /// scheduler since the runtime is shutting down.
    pub fn stop(self: &Arc<Self>) {
        if !self.running.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(handle) = self.worker.lock().take() {
            let _ = handle.join();
        }
        for queue in [&self.queue_a, &self.queue_b] {
            while let Some(weak) = queue.pop() {
                if let Some(task) = weak.upgrade() {
                    task.destroy();
                }
            }
        }
    }
}
