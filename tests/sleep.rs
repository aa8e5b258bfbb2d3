//! Scenario 1 (spec §8): a task that awaits a 50 ms sleep finishes with
//! `done` after at least 50 ms and under 200 ms.

use std::sync::mpsc;
use std::time::{Duration, Instant};

use fastloop::{task, RuntimeConfig};

#[test]
fn sleep_completes_within_bounds() {
    let runtime = fastloop::Runtime::new(RuntimeConfig::new().scheduler_count(2)).unwrap();
    runtime.start();

    let handle = runtime.handle();
    let (tx, rx) = mpsc::channel();

    let sleep_handle = handle.clone();
    let t = task::create(async move {
        let start = Instant::now();
        sleep_handle.sleep(Duration::from_millis(50)).await;
        let elapsed = start.elapsed();
        tx.send(elapsed).unwrap();
        "done"
    });
    runtime.schedule(&t);

    let elapsed = rx.recv_timeout(Duration::from_secs(2)).expect("task did not finish");
    assert!(elapsed >= Duration::from_millis(50));
    assert!(elapsed < Duration::from_millis(200));

    while !t.is_finished() {
        std::thread::sleep(Duration::from_millis(1));
    }
    assert_eq!(t.take_result(), Some("done"));

    runtime.stop();
}
