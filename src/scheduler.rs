//! Task Scheduler (spec §4.2): one worker thread consuming a multi-producer
//! queue of `(Action, WeakTask)` pairs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle as ThreadJoinHandle;

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::task::{Task, TaskErased, WeakTask};

enum Action {
    Resume(WeakTask),
    Destroy(WeakTask),
    Stop,
}

/// One scheduler = one dedicated worker thread. A task executes on exactly
/// one scheduler at a time; its scheduler pointer is published before the
/// first enqueue (§4.2 invariants).
pub struct TaskScheduler {
    name: String,
    tx: Sender<Action>,
    rx: Receiver<Action>,
    running: AtomicBool,
    worker: parking_lot::Mutex<Option<ThreadJoinHandle<()>>>,
}

impl TaskScheduler {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        let (tx, rx) = unbounded();
        Arc::new(TaskScheduler {
            name: name.into(),
            tx,
            rx,
            running: AtomicBool::new(false),
            worker: parking_lot::Mutex::new(None),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Starts the worker thread. Idempotent.
    pub fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::AcqRel) {
            return;
        }
        let rx = self.rx.clone();
        let name = self.name.clone();
        let handle = std::thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                tracing::info!(scheduler = %name, "task scheduler starting");
                for action in rx.iter() {
                    match action {
                        Action::Resume(weak) => {
                            if let Some(task) = weak.upgrade() {
                                task.poll_once();
                            }
                            // Expired weak refs are silently skipped (§4.2).
                        }
                        Action::Destroy(weak) => {
                            if let Some(task) = weak.upgrade() {
                                task.destroy();
                            }
                        }
                        Action::Stop => break,
                    }
                }
            })
            .expect("failed to spawn task scheduler worker thread");
        *self.worker.lock() = Some(handle);
    }

    /// Enqueues a sentinel and joins the worker thread. Idempotent.
    pub fn stop(self: &Arc<Self>) {
        if !self.running.swap(false, Ordering::AcqRel) {
            return;
        }
        let _ = self.tx.send(Action::Stop);
        if let Some(handle) = self.worker.lock().take() {
            let _ = handle.join();
        }
    }

    /// Binds `task`'s scheduler pointer to `self` and enqueues a Resume
    /// action. Used both for fresh submissions and for waking a suspended
    /// task.
    pub fn resume(self: &Arc<Self>, weak: WeakTask) {
        if let Some(task) = weak.upgrade() {
            *task.scheduler_slot().lock() = Some(Arc::downgrade(self));
        }
        self.send(Action::Resume(weak));
    }

    /// Enqueues a Destroy action; causes the task to drop on the worker
    /// thread so destructors run in the right context (§4.2).
    pub fn destroy(self: &Arc<Self>, weak: WeakTask) {
        if let Some(task) = weak.upgrade() {
            *task.scheduler_slot().lock() = Some(Arc::downgrade(self));
        }
        self.send(Action::Destroy(weak));
    }

    /// Move-submits a newly created task: equivalent to `resume` of its
    /// origin weak reference (§4.2 `schedule`).
    pub fn schedule<T: Send + 'static>(self: &Arc<Self>, task: &Task<T>) {
        crate::task::bind(task, self);
        self.send(Action::Resume(task.weak()));
    }

    fn send(&self, action: Action) {
        // A send failing for any reason other than shutdown (the channel
        // never disconnects while this scheduler is alive, since `self.tx`
        // keeps it open) is a configuration error, not a runtime condition
        // (§4.2 Failure).
        self.tx
            .send(action)
            .expect("task scheduler queue disconnected unexpectedly");
    }
}

impl Drop for TaskScheduler {
    fn drop(&mut self) {
        if self.running.load(Ordering::Acquire) {
            let _ = self.tx.send(Action::Stop);
            if let Some(handle) = self.worker.lock().take() {
                let _ = handle.join();
            }
        }
    }
}
