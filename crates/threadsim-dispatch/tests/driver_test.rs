//! Scenario 5 from SPEC_FULL §8: cancelling a `Go(ever)` call makes its
//! done-channel deliver an interrupted outcome and the driver stop
//! accepting further work. Grounded on `driver.rs`'s own cancellation
//! wiring (`DispatchDriver::cancel`/`post_async`).

use std::time::Duration;

use threadsim_core::event::{Event, EventKind};
use threadsim_core::{MsgId, NodeId};
use threadsim_dispatch::{Dispatcher, DispatchDriver, NodeConfig, Speed};
use threadsim_radio::{RadioModelConfig, RadioModelKind};

#[test]
fn cancel_interrupts_go_and_stops_the_driver() {
    let mut dispatcher = Dispatcher::new(RadioModelKind::Ideal, RadioModelConfig::default(), 1);
    let (tx, _rx) = crossbeam_channel::unbounded();
    let id = NodeId(1);
    dispatcher.add_node(id, NodeConfig::default(), tx).unwrap();

    // Five alarms, two virtual seconds apart. Each `ingress` call
    // advances the node's own virtual clock from where the last one
    // left off, so these land at 2s, 4s, ..., 10s.
    for i in 0..5u32 {
        dispatcher.ingress(id, Event::new(EventKind::AlarmFired, id, MsgId(i + 1), 2_000_000)).unwrap();
    }

    let driver = DispatchDriver::spawn(dispatcher);
    // At 5x speed each alarm is ~0.4s of wall time apart, leaving a
    // comfortable window to cancel between the first and second.
    let done = driver.go_at_speed(20_000_000, Speed::Factor(5.0));

    std::thread::sleep(Duration::from_millis(100));
    driver.cancel();

    let outcome = done.recv_timeout(Duration::from_secs(5)).expect("Go should report an outcome");
    assert!(outcome.interrupted);

    // The worker thread breaks its outer loop on an interrupted Go, so
    // the command channel is disconnected and further posts fail.
    std::thread::sleep(Duration::from_millis(50));
    assert!(!driver.post_async(|_| {}));
}
