//! Literal scenarios from SPEC_FULL §8 "TESTABLE PROPERTIES", driven
//! directly against [`threadsim_dispatch::Dispatcher`] without a
//! transport or driver thread. Each node's startup handshake (NodeInfo
//! then StatusPush) is ingressed by hand, mirroring `core.rs`'s own
//! `two_node_radio_comm_delivers_and_counts` unit test.

use std::collections::HashMap;

use threadsim_core::event::{Event, EventKind, SubRecord};
use threadsim_core::{CounterName, MsgId, NodeId, SimTime};
use threadsim_dispatch::{Dispatcher, NodeConfig};
use threadsim_node::FailTime;
use threadsim_radio::{Position, RadioModelConfig, RadioModelKind};

fn dispatcher(kind: RadioModelKind, config: RadioModelConfig) -> Dispatcher {
    Dispatcher::new(kind, config, 7)
}

/// Adds a node and runs its startup handshake (NodeInfo + StatusPush),
/// which is what flips `all_ready_nodes_waiting()` to true for it.
fn add_ready(d: &mut Dispatcher, id: i32, x: f64, y: f64, radio_range_units: f64) -> NodeId {
    let (tx, _rx) = crossbeam_channel::unbounded();
    let nid = NodeId(id);
    d.add_node(
        nid,
        NodeConfig { position: Position { x, y, z: 0.0 }, radio_range_units, ..Default::default() },
        tx,
    )
    .unwrap();
    d.ingress(nid, Event::new(EventKind::NodeInfo, nid, MsgId(1), 0)).unwrap();
    d.ingress(nid, Event::new(EventKind::StatusPush, nid, MsgId(2), 0)).unwrap();
    nid
}

fn radio_comm_start(node: NodeId, channel: u8, duration_us: u64, msg: u32) -> Event {
    Event::new(EventKind::RadioCommStart, node, MsgId(msg), 0).with_sub_record(SubRecord::RadioComm {
        channel,
        tx_power_dbm: 0,
        error: 0,
        duration_us,
    })
}

fn uart_line(node: NodeId, line: &str, msg: u32) -> Event {
    Event::new(EventKind::UartWrite, node, MsgId(msg), 0).with_payload(line.as_bytes().to_vec())
}

fn counters(d: &Dispatcher) -> HashMap<CounterName, u64> {
    d.counters().into_iter().collect()
}

/// Scenario 1: two-node deterministic ping.
#[test]
fn two_node_deterministic_ping() {
    let mut d = dispatcher(RadioModelKind::Ideal, RadioModelConfig::default());
    let a = add_ready(&mut d, 1, 0.0, 0.0, 100.0);
    let b = add_ready(&mut d, 2, 50.0, 0.0, 100.0);
    d.set_pings_collection_enabled(true);

    for i in 0..3u32 {
        d.ingress(a, radio_comm_start(a, 11, 400, 10 + i)).unwrap();
        d.ingress(b, uart_line(b, "16 bytes from fdde::1: icmp_seq=1 hlim=64 time=7ms", 20 + i)).unwrap();
    }

    d.advance_to(SimTime::from_secs(5));

    let snapshot = counters(&d);
    assert!(snapshot[&CounterName::RadioEvents] >= 6);
    assert_eq!(d.collect_pings().len(), 3);
    assert!(d.collect_pings()[0].delay_us <= 10_000);
}

/// Scenario 2: out-of-range drop. MIDisc model, nodes far enough apart
/// that neither is inside the other's disc (`radio_range_units * 26.7m`).
#[test]
fn out_of_range_drop() {
    let mut d = dispatcher(RadioModelKind::MIDisc, RadioModelConfig::default());
    let a = add_ready(&mut d, 1, 0.0, 0.0, 10.0);
    let b = add_ready(&mut d, 2, 1000.0, 0.0, 10.0);
    d.set_pings_collection_enabled(true);

    d.ingress(a, radio_comm_start(a, 11, 400, 1)).unwrap();
    d.advance_to(SimTime::from_secs(5));

    assert!(d.collect_pings().is_empty());
    assert_eq!(counters(&d)[&CounterName::CollisionEvents], 0);
}

/// Scenario 3: concurrent collision. Two simultaneous transmitters on
/// the same channel; the third node's reception carries error=FCS.
#[test]
fn concurrent_collision() {
    let mut d = dispatcher(RadioModelKind::MutualInterference, RadioModelConfig::default());
    let a = add_ready(&mut d, 1, 0.0, 0.0, 100.0);
    let b = add_ready(&mut d, 2, 10.0, 0.0, 100.0);
    let _c = add_ready(&mut d, 3, 5.0, 0.0, 100.0);

    d.ingress(a, radio_comm_start(a, 11, 400, 1)).unwrap();
    d.ingress(b, radio_comm_start(b, 11, 400, 2)).unwrap();
    d.advance_to(SimTime::from_secs(1));

    assert!(counters(&d)[&CounterName::CollisionEvents] >= 1);
}

/// Scenario 4: failure schedule boundary, transmitter side. A node with
/// `FailTime{d=10s, i=60s}` rejects a radio-comm-start inside the
/// failure window (no reception reaches the peer) and accepts one
/// after it (the peer's reception counter advances).
#[test]
fn failure_schedule_boundary_transmitter_side() {
    let mut d = dispatcher(RadioModelKind::Ideal, RadioModelConfig::default());
    let a = add_ready(&mut d, 1, 0.0, 0.0, 100.0);
    let _b = add_ready(&mut d, 2, 50.0, 0.0, 100.0);
    d.set_fail_time(a, FailTime::new(10_000_000, 60_000_000).unwrap()).unwrap();

    // Inside the [0s, 10s) failure window: the comm-start is aborted
    // before the radio model ever schedules a reception for node b.
    d.ingress(a, radio_comm_start(a, 11, 400, 1)).unwrap();
    d.advance_to(SimTime::from_secs(5));
    let in_range_after_failed_attempt = counters(&d)[&CounterName::DispatchAllInRange];
    assert_eq!(in_range_after_failed_attempt, 0);

    // Move a's own virtual clock to second 20, past the failure window,
    // then retry; this attempt reaches node b.
    d.ingress(a, Event::new(EventKind::AlarmFired, a, MsgId(2), 15_000_000)).unwrap();
    d.advance_to(SimTime::from_secs(20));
    d.ingress(a, radio_comm_start(a, 11, 400, 3)).unwrap();
    d.advance_to(SimTime::from_secs(21));

    assert!(counters(&d)[&CounterName::DispatchAllInRange] > in_range_after_failed_attempt);
}

/// Scenario 4, receiver side: a second node pings the node under the
/// failure schedule. The receiver's own `FailTime{d=10s, i=60s}` rejects
/// the `RadioRxDone` delivery while its window is active — nothing is
/// written to its outgoing transport — and accepts one delivered after
/// the window closes.
#[test]
fn failure_schedule_boundary_receiver_side() {
    let mut d = dispatcher(RadioModelKind::Ideal, RadioModelConfig::default());
    let pinger = add_ready(&mut d, 1, 0.0, 0.0, 100.0);
    let (b_tx, b_rx) = crossbeam_channel::unbounded();
    let b = NodeId(2);
    d.add_node(b, NodeConfig { position: Position { x: 50.0, y: 0.0, z: 0.0 }, ..Default::default() }, b_tx)
        .unwrap();
    d.ingress(b, Event::new(EventKind::NodeInfo, b, MsgId(1), 0)).unwrap();
    d.ingress(b, Event::new(EventKind::StatusPush, b, MsgId(2), 0)).unwrap();
    d.set_fail_time(b, FailTime::new(10_000_000, 60_000_000).unwrap()).unwrap();

    let radio_rx_done_count = |rx: &crossbeam_channel::Receiver<Vec<u8>>| {
        let mut count = 0;
        while let Ok(bytes) = rx.try_recv() {
            if let Ok(Some((evt, _))) = threadsim_wire::decode_event(&bytes, b) {
                if evt.kind == EventKind::RadioRxDone {
                    count += 1;
                }
            }
        }
        count
    };

    // Inside b's [0s, 10s) failure window: the ping reaches the radio
    // model and would normally schedule a reception, but b's own
    // `accepts_radio_received` gate drops it before delivery.
    d.ingress(pinger, radio_comm_start(pinger, 11, 400, 1)).unwrap();
    d.advance_to(SimTime::from_secs(5));
    assert_eq!(radio_rx_done_count(&b_rx), 0, "b's failure window should have dropped the reception");

    // Past b's failure window, the same ping is delivered normally.
    d.ingress(pinger, Event::new(EventKind::AlarmFired, pinger, MsgId(2), 15_000_000)).unwrap();
    d.advance_to(SimTime::from_secs(20));
    d.ingress(pinger, radio_comm_start(pinger, 11, 400, 3)).unwrap();
    d.advance_to(SimTime::from_secs(21));
    assert_eq!(radio_rx_done_count(&b_rx), 1, "b should receive the ping once its failure window has closed");
}
