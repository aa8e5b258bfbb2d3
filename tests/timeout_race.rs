//! Scenarios 4 and 5 (spec §8): `timeout()` races an inner future against a
//! deadline; whichever arrives first wins, and the loser is cancelled.

use std::sync::mpsc;
use std::time::Duration;

use fastloop::{task, RuntimeConfig};

#[test]
fn timeout_wins_when_inner_is_slower() {
    let runtime = fastloop::Runtime::new(RuntimeConfig::new().scheduler_count(2)).unwrap();
    runtime.start();

    let handle = runtime.handle();
    let (tx, rx) = mpsc::channel();

    let timeout_handle = handle.clone();
    let inner_handle = handle.clone();
    let t = task::create(async move {
        let result = timeout_handle
            .timeout(Duration::from_millis(10), async move {
                inner_handle.sleep(Duration::from_millis(1000)).await;
                "inner value"
            })
            .await;
        tx.send(result.is_err()).unwrap();
    });
    runtime.schedule(&t);

    let timed_out = rx
        .recv_timeout(Duration::from_millis(200))
        .expect("timeout race did not settle in time");
    assert!(timed_out, "expected the timeout to win");

    runtime.stop();
}

#[test]
fn inner_wins_when_faster_than_the_deadline() {
    let runtime = fastloop::Runtime::new(RuntimeConfig::new().scheduler_count(2)).unwrap();
    runtime.start();

    let handle = runtime.handle();
    let (tx, rx) = mpsc::channel();

    let timeout_handle = handle.clone();
    let inner_handle = handle.clone();
    let t = task::create(async move {
        let result = timeout_handle
            .timeout(Duration::from_millis(1000), async move {
                inner_handle.sleep(Duration::from_millis(10)).await;
                42
            })
            .await;
        tx.send(result.ok()).unwrap();
    });
    runtime.schedule(&t);

    let value = rx
        .recv_timeout(Duration::from_millis(200))
        .expect("timeout race did not settle in time");
    assert_eq!(value, Some(42));

    runtime.stop();
}
