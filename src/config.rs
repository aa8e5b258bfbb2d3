//! Runtime configuration (spec §6 "Environment / configuration": "None
//! required. Optional tunables: number of task schedulers, reactor wait cap,
//! liveness sweep interval, initial fd-table capacity"). No environment
//! variables are read here; a binary embedding this crate may choose to.

use std::time::Duration;

/// Builder for the knobs [`crate::runtime::Runtime::new`] accepts. All
/// fields have defaults matching the galay original (liveness off, 1024
/// max in-flight readiness events per `poll`).
#[derive(Clone)]
pub struct RuntimeConfig {
    pub(crate) scheduler_count: usize,
    pub(crate) reactor_wait_cap: Duration,
    pub(crate) reactor_max_events: usize,
    pub(crate) liveness_interval: Option<Duration>,
}

impl RuntimeConfig {
    pub fn new() -> Self {
        RuntimeConfig {
            scheduler_count: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            reactor_wait_cap: Duration::from_millis(100),
            reactor_max_events: 1024,
            liveness_interval: None,
        }
    }

    pub fn scheduler_count(mut self, count: usize) -> Self {
        assert!(count > 0, "a runtime needs at least one task scheduler");
        self.scheduler_count = count;
        self
    }

    pub fn reactor_wait_cap(mut self, cap: Duration) -> Self {
        self.reactor_wait_cap = cap;
        self
    }

    /// Initial fd-table capacity, i.e. the poller's max-events-per-wait
    /// buffer size (§6).
    pub fn reactor_max_events(mut self, max_events: usize) -> Self {
        self.reactor_max_events = max_events;
        self
    }

    /// Enables the liveness manager with the given sweep interval. Off by
    /// default, matching the galay original's `start_check = false`.
    pub fn liveness_interval(mut self, interval: Duration) -> Self {
        self.liveness_interval = Some(interval);
        self
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new()
    }
}
