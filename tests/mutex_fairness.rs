//! Scenario 3 (spec §8): two tasks contend for an `AsyncMutex`; the one that
//! arrived first while the lock was held runs next, ahead of a third arrival
//! registered afterwards.

use std::sync::{mpsc, Arc};
use std::time::Duration;

use fastloop::sync::AsyncMutex;
use fastloop::{task, RuntimeConfig};

#[test]
fn second_arrival_runs_before_a_later_third() {
    let runtime = fastloop::Runtime::new(RuntimeConfig::new().scheduler_count(2)).unwrap();
    runtime.start();

    let handle = runtime.handle();
    let mutex = Arc::new(AsyncMutex::new());
    let order = Arc::new(parking_lot::Mutex::new(Vec::<&'static str>::new()));
    let (tx, rx) = mpsc::channel();

    let mutex_a = mutex.clone();
    let order_a = order.clone();
    let sleep_handle = handle.clone();
    let a = task::create(async move {
        let guard = mutex_a.lock().await;
        order_a.lock().push("a");
        // Hold the lock long enough for B to arrive and queue behind it.
        sleep_handle.sleep(Duration::from_millis(30)).await;
        drop(guard);
    });
    runtime.schedule(&a);

    // Give A time to actually take the lock before B arrives.
    std::thread::sleep(Duration::from_millis(10));

    let mutex_b = mutex.clone();
    let order_b = order.clone();
    let tx_b = tx.clone();
    let b = task::create(async move {
        let _guard = mutex_b.lock().await;
        order_b.lock().push("b");
        tx_b.send(()).unwrap();
    });
    runtime.schedule(&b);

    // C arrives well after B has already queued.
    std::thread::sleep(Duration::from_millis(10));

    let mutex_c = mutex.clone();
    let order_c = order.clone();
    let c = task::create(async move {
        let _guard = mutex_c.lock().await;
        order_c.lock().push("c");
        tx.send(()).unwrap();
    });
    runtime.schedule(&c);

    rx.recv_timeout(Duration::from_secs(1)).unwrap();
    rx.recv_timeout(Duration::from_secs(1)).unwrap();

    assert_eq!(&*order.lock(), &["a", "b", "c"]);

    runtime.stop();
}
