//! `sleep` — the timer-driven awaitable exemplar named in spec §4.5.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use super::{Timer, TimerService};

enum State {
    Start,
    Waiting { fired: Arc<AtomicBool>, _timer: Timer },
}

/// Suspends the calling task for `duration`, driven by `service` rather than
/// kernel readiness (§4.5 "Timer operations: sleep (no payload)").
pub struct Sleep {
    service: Arc<TimerService>,
    duration: Duration,
    state: State,
}

pub fn sleep(service: &Arc<TimerService>, duration: Duration) -> Sleep {
    Sleep {
        service: service.clone(),
        duration,
        state: State::Start,
    }
}

impl Future for Sleep {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();
        loop {
            match &this.state {
                State::Start => {
                    let fired = Arc::new(AtomicBool::new(false));
                    let fired_for_cb = fired.clone();
                    let waker = cx.waker().clone();
                    let timer = this.service.schedule(this.duration, move || {
                        fired_for_cb.store(true, Ordering::Release);
                        waker.wake();
                    });
                    this.state = State::Waiting {
                        fired,
                        _timer: timer,
                    };
                }
                State::Waiting { fired, .. } => {
                    return if fired.load(Ordering::Acquire) {
                        Poll::Ready(())
                    } else {
                        Poll::Pending
                    };
                }
            }
        }
    }
}
