//! `timeout()` (spec §4.5 "composition primitives"): races an operation
//! against a sleep, built from [`LimitWaiter`] rather than as a primitive of
//! its own — the loser is cancelled through the same path any other task
//! cancellation takes.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::scheduler::TaskScheduler;
use crate::task;
use crate::timer::{sleep, TimerService};

use super::limit_waiter::LimitWaiter;

#[derive(Debug, thiserror::Error)]
#[error("operation timed out")]
pub struct Elapsed;

/// Runs `future` to completion on `scheduler`, racing it against a timer of
/// `duration`. If the timer wins, `future`'s task is destroyed and
/// `Err(Elapsed)` is returned; otherwise the timer is cancelled via
/// `LimitWaiter`'s `destroyTasks` and `future`'s output is returned.
pub async fn timeout<F, T>(
    duration: Duration,
    scheduler: &Arc<TaskScheduler>,
    timer: &Arc<TimerService>,
    future: F,
) -> Result<T, Elapsed>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let waiter = Arc::new(LimitWaiter::<T, ()>::new());

    let op_waiter = waiter.clone();
    let op_task = task::create(async move {
        let value = future.await;
        op_waiter.notify(Ok(value));
    });

    let timer_waiter = waiter.clone();
    let timer_service = timer.clone();
    let timer_task = task::create(async move {
        sleep(&timer_service, duration).await;
        timer_waiter.notify(Err(()));
    });

    waiter.append_task(&op_task, scheduler);
    waiter.append_task(&timer_task, scheduler);

    waiter.wait().await.map_err(|_| Elapsed)
}
