//! Structured logging init (spec §11 ambient stack). Library code only ever
//! emits `tracing` events; nothing in `src/` installs a global subscriber.
//! This helper exists for tests and embedding binaries, the same way
//! `async-exec`'s test modules call `tracing_subscriber::fmt()` directly
//! rather than the library installing one itself.

use tracing_subscriber::EnvFilter;

/// Installs a `fmt` subscriber reading `RUST_LOG` (defaulting to `info` when
/// unset), with per-thread names so scheduler/reactor/timer log lines are
/// attributable. Safe to call more than once; later calls are no-ops.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_thread_names(true)
        .try_init();
}
