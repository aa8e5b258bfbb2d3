//! Runtime (spec §4.7): owns the reactor, the timer service, N task
//! schedulers, an atomic round-robin index, and an optional liveness
//! manager. The single composition root the rest of the crate is built to
//! be used through.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::RuntimeConfig;
use crate::liveness::LivenessManager;
use crate::reactor::EventReactor;
use crate::scheduler::TaskScheduler;
use crate::task::{Task, WeakTask};
use crate::timer::TimerService;

/// Owns every long-lived thread the runtime starts. Constructed via
/// [`Runtime::new`], started with [`Runtime::start`], and must be stopped
/// with [`Runtime::stop`] before it is dropped if it was ever started.
pub struct Runtime {
    reactor: Arc<EventReactor>,
    timer: Arc<TimerService>,
    schedulers: Vec<Arc<TaskScheduler>>,
    next: AtomicUsize,
    liveness: Option<Arc<LivenessManager>>,
    reactor_thread: parking_lot::Mutex<Option<std::thread::JoinHandle<()>>>,
}

impl Runtime {
    pub fn new(config: RuntimeConfig) -> io::Result<Arc<Self>> {
        let reactor = EventReactor::new(config.reactor_max_events, config.reactor_wait_cap)?;
        let timer = TimerService::new();
        let schedulers = (0..config.scheduler_count)
            .map(|i| TaskScheduler::new(format!("task-scheduler-{i}")))
            .collect();
        let liveness = config.liveness_interval.map(LivenessManager::new);
        Ok(Arc::new(Runtime {
            reactor,
            timer,
            schedulers,
            next: AtomicUsize::new(0),
            liveness,
            reactor_thread: parking_lot::Mutex::new(None),
        }))
    }

    /// Starts the reactor thread, the timer service, and every task
    /// scheduler. Idempotent (each component's own `start` is idempotent).
    pub fn start(self: &Arc<Self>) {
        if self.reactor_thread.lock().is_some() {
            return;
        }
        let reactor = self.reactor.clone();
        let handle = std::thread::Builder::new()
            .name("event-reactor".into())
            .spawn(move || {
                // The timer service runs its own wait thread (§5 "Threads" allows
                // it co-located or separate; this runtime keeps it separate), so
                // the reactor's own `wait_cap` is the only timeout hint needed here.
                reactor.start(|| None);
            })
            .expect("failed to spawn event reactor thread");
        *self.reactor_thread.lock() = Some(handle);

        self.timer.start();
        for scheduler in &self.schedulers {
            scheduler.start();
        }
        if let Some(liveness) = &self.liveness {
            liveness.start();
        }
        tracing::info!(schedulers = self.schedulers.len(), "runtime started");
    }

    /// Stops timer, then reactor, then schedulers, in that order (§4.7
    /// `stop`). Idempotent and safe to call from any thread.
    pub fn stop(self: &Arc<Self>) {
        self.timer.stop();
        self.reactor.stop();
        if let Some(handle) = self.reactor_thread.lock().take() {
            let _ = handle.join();
        }
        for scheduler in &self.schedulers {
            scheduler.stop();
        }
        if let Some(liveness) = &self.liveness {
            liveness.stop();
        }
        tracing::info!("runtime stopped");
    }

    /// Picks a scheduler by round-robin (atomic increment mod N) and submits
    /// `task`; registers it with the liveness manager if one is configured
    /// (§4.7 `schedule(task)`).
    pub fn schedule<T: Send + 'static>(self: &Arc<Self>, task: &Task<T>) {
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.schedulers.len();
        self.schedulers[index].schedule(task);
        if let Some(liveness) = &self.liveness {
            liveness.manage(task.weak());
        }
    }

    /// Submits to a specific scheduler by index (§4.7 `schedule(task,
    /// token)`). Panics if `token` is out of range, matching the spec's
    /// "error if out of range" for a call that is a programming error, not a
    /// runtime condition.
    pub fn schedule_on<T: Send + 'static>(self: &Arc<Self>, task: &Task<T>, token: usize) {
        let scheduler = self
            .schedulers
            .get(token)
            .unwrap_or_else(|| panic!("scheduler token {token} out of range"));
        scheduler.schedule(task);
        if let Some(liveness) = &self.liveness {
            liveness.manage(task.weak());
        }
    }

    pub fn scheduler_count(&self) -> usize {
        self.schedulers.len()
    }

    pub fn reactor(&self) -> &Arc<EventReactor> {
        &self.reactor
    }

    pub fn timer(&self) -> &Arc<TimerService> {
        &self.timer
    }

    /// A lightweight handle bundling a scheduler (round-robin-chosen at
    /// construction), the timer service, and the reactor, for code that
    /// needs to drive async primitives without holding the whole `Runtime`
    /// (§4.7 `handle()`).
    pub fn handle(self: &Arc<Self>) -> RuntimeHandle {
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.schedulers.len();
        RuntimeHandle {
            scheduler: self.schedulers[index].clone(),
            timer: self.timer.clone(),
            reactor: self.reactor.clone(),
        }
    }
}

/// A cheap, cloneable handle exposing one task scheduler plus shared access
/// to the timer service and reactor — the "factory for async primitives"
/// named in §4.7.
#[derive(Clone)]
pub struct RuntimeHandle {
    scheduler: Arc<TaskScheduler>,
    timer: Arc<TimerService>,
    reactor: Arc<EventReactor>,
}

impl RuntimeHandle {
    pub fn scheduler(&self) -> &Arc<TaskScheduler> {
        &self.scheduler
    }

    pub fn timer(&self) -> &Arc<TimerService> {
        &self.timer
    }

    pub fn reactor(&self) -> &Arc<EventReactor> {
        &self.reactor
    }

    pub fn schedule<T: Send + 'static>(&self, task: &Task<T>) {
        self.scheduler.schedule(task);
    }

    pub fn sleep(&self, duration: Duration) -> crate::timer::Sleep {
        crate::timer::sleep(&self.timer, duration)
    }

    pub async fn timeout<F, T>(&self, duration: Duration, future: F) -> Result<T, crate::sync::Elapsed>
    where
        F: std::future::Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        crate::sync::timeout(duration, &self.scheduler, &self.timer, future).await
    }

    /// Resumes a weakly-held task on this handle's scheduler, the primitive
    /// every composition type (mutex, waiter, channel) ultimately calls to
    /// wake a sleeper.
    pub fn resume(&self, weak: WeakTask) {
        self.scheduler.resume(weak);
    }
}
