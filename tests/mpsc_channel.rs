//! Scenario 6 (spec §8): 4 producers each send 25 000 integers (100 000
//! total) to one `MpscChannel`; the single consumer must receive every one
//! exactly once, in no guaranteed order.

use std::sync::mpsc;
use std::time::Duration;

use fastloop::sync::channel::mpsc as fastloop_mpsc;
use fastloop::{task, RuntimeConfig};

const PRODUCERS: u32 = 4;
const PER_PRODUCER: u32 = 25_000;

#[test]
fn every_item_is_received_exactly_once() {
    let runtime = fastloop::Runtime::new(RuntimeConfig::new().scheduler_count(4)).unwrap();
    runtime.start();

    let (sender, channel) = fastloop_mpsc::channel::<(u32, u32)>();
    let (done_tx, done_rx) = mpsc::channel();

    for producer_id in 0..PRODUCERS {
        let sender = sender.clone();
        let producer = task::create(async move {
            for value in 0..PER_PRODUCER {
                sender.send((producer_id, value));
            }
        });
        runtime.schedule(&producer);
    }
    drop(sender);

    let total = PRODUCERS as usize * PER_PRODUCER as usize;
    let consumer = task::create(async move {
        let mut seen = vec![vec![false; PER_PRODUCER as usize]; PRODUCERS as usize];
        let mut received = 0usize;
        while received < total {
            let (producer_id, value) = channel.recv().await;
            let slot = &mut seen[producer_id as usize][value as usize];
            assert!(!*slot, "duplicate delivery of ({producer_id}, {value})");
            *slot = true;
            received += 1;
        }
        done_tx.send(received).unwrap();
    });
    runtime.schedule(&consumer);

    let received = done_rx
        .recv_timeout(Duration::from_secs(30))
        .expect("consumer did not finish");
    assert_eq!(received, total);

    runtime.stop();
}
