//! `NodeHandle`: per-child state owned exclusively by the dispatcher
//! thread (SPEC_FULL §3, §4.4). Grounded on `node_thread.rs`'s
//! `NodeCommand`/`NodeReport` split (here: a send-only outgoing channel
//! plus dispatcher-applied mutations) and the watch-level idiom already
//! used by this codebase's `EntityTracer`.

use crate::command::{CommandKind, CommandOutcome, PendingCommand};
use crate::error::{NodeError, NodeResult};
use crate::fail_time::FailTime;
use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};
use threadsim_core::event::Event;
use threadsim_core::{NodeId, SimTime};
use threadsim_radio::Position;

/// Coarse radio power state reported by the child (SPEC_FULL §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RadioPowerState {
    Disabled,
    Sleep,
    Rx,
    Tx,
}

/// Per-node diagnostic verbosity, set via `WatchNode(id, level)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WatchLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Default for WatchLevel {
    fn default() -> Self {
        WatchLevel::Off
    }
}

/// One child process's simulated identity and scheduling state.
#[derive(Debug)]
pub struct NodeHandle {
    pub id: NodeId,
    pub ext_addr: u64,
    pub short_addr: u16,
    pub role: u8,
    pub partition_id: u32,
    pub position: Position,
    pub radio_range_units: f64,
    pub radio_state: RadioPowerState,
    pub radio_sub_state: u8,
    pub last_radio_time: SimTime,
    fail_time: FailTime,
    virt_time: SimTime,
    waiting: bool,
    watch_level: WatchLevel,
    is_failed: bool,
    is_disconnected: bool,
    pending_event_count: u64,
    pending_command: Option<PendingCommand>,
    outgoing: Sender<Vec<u8>>,
}

impl NodeHandle {
    pub fn new(id: NodeId, outgoing: Sender<Vec<u8>>) -> Self {
        NodeHandle {
            id,
            ext_addr: 0,
            short_addr: 0,
            role: 0,
            partition_id: 0,
            position: Position::default(),
            radio_range_units: 100.0,
            radio_state: RadioPowerState::Disabled,
            radio_sub_state: 0,
            last_radio_time: SimTime::ZERO,
            fail_time: FailTime::DISABLED,
            virt_time: SimTime::ZERO,
            waiting: false,
            watch_level: WatchLevel::Off,
            is_failed: false,
            is_disconnected: false,
            pending_event_count: 0,
            pending_command: None,
            outgoing,
        }
    }

    pub fn virt_time(&self) -> SimTime {
        self.virt_time
    }

    pub fn is_waiting(&self) -> bool {
        self.waiting
    }

    pub fn is_failed(&self) -> bool {
        self.is_failed
    }

    pub fn is_disconnected(&self) -> bool {
        self.is_disconnected
    }

    pub fn pending_event_count(&self) -> u64 {
        self.pending_event_count
    }

    pub fn watch_level(&self) -> WatchLevel {
        self.watch_level
    }

    pub fn set_watch_level(&mut self, level: WatchLevel) {
        self.watch_level = level;
    }

    pub fn set_failed(&mut self, failed: bool) {
        self.is_failed = failed;
    }

    pub fn set_fail_time(&mut self, ft: FailTime) {
        self.fail_time = ft;
    }

    pub fn fail_time(&self) -> FailTime {
        self.fail_time
    }

    /// Whether `virt_time` currently falls inside a failure window.
    pub fn is_in_failure_window(&self) -> bool {
        self.fail_time.is_failing_at(self.virt_time.as_micros())
    }

    /// Time-sync handshake (SPEC_FULL §4.4): resolves the node's new
    /// virtual time from a delivered event's timestamp and its own delay.
    pub fn advance_virt_time(&mut self, delivered_ts: SimTime, delay_us: u64) -> SimTime {
        let base = if delivered_ts > self.virt_time { delivered_ts } else { self.virt_time };
        self.virt_time = base.plus_delay(delay_us);
        self.virt_time
    }

    /// Marks the node active (non-waiting); called whenever it emits an
    /// event other than an alarm-fired/status-push terminator.
    pub fn on_event_emitted(&mut self, terminator: bool) {
        self.pending_event_count += 1;
        self.waiting = terminator;
    }

    /// Marks the node active again once a subsequent event is delivered
    /// to it, per the "waiting" definition in SPEC_FULL §4.4.
    pub fn on_event_delivered(&mut self) {
        self.waiting = false;
    }

    /// Whether an outgoing radio-comm-start from this node should be
    /// accepted, or rejected with ABORT per the active failure window.
    pub fn accepts_radio_comm_start(&self) -> bool {
        !self.is_in_failure_window() && !self.is_failed && !self.is_disconnected
    }

    /// Whether an inbound radio-received event should be delivered, or
    /// silently discarded per the active failure window.
    pub fn accepts_radio_received(&self) -> bool {
        !self.is_in_failure_window() && !self.is_failed && !self.is_disconnected
    }

    pub fn disconnect(&mut self) {
        self.is_disconnected = true;
        self.waiting = false;
    }

    /// Encodes and writes `evt` to the child transport.
    pub fn send_event(&self, evt: &Event) -> NodeResult<()> {
        if self.is_disconnected {
            return Err(NodeError::NodeDisconnected);
        }
        let bytes = threadsim_wire::encode_event(evt).map_err(|_| NodeError::NodeDisconnected)?;
        self.outgoing.send(bytes).map_err(|_| NodeError::NodeDisconnected)
    }

    /// Begins a `Command`/`CommandExpectNone` request (SPEC_FULL §4.4).
    pub fn begin_command(&mut self, text: impl Into<String>, kind: CommandKind, timeout_us: u64) {
        self.pending_command = Some(PendingCommand::new(text, kind, self.virt_time, timeout_us));
    }

    /// Feeds one decoded uart-write line into the pending command, if any.
    pub fn feed_command_line(&mut self, line: String) -> Option<CommandOutcome> {
        let outcome = self.pending_command.as_mut()?.push_line(line)?;
        self.pending_command = None;
        Some(outcome)
    }

    /// Polls the pending command for virtual-time expiry.
    pub fn poll_command_timeout(&mut self) -> Option<CommandOutcome> {
        if self.pending_command.as_ref()?.is_expired(self.virt_time) {
            return self.pending_command.take().map(PendingCommand::expire);
        }
        None
    }

    pub fn has_pending_command(&self) -> bool {
        self.pending_command.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> NodeHandle {
        let (tx, _rx) = crossbeam_channel::unbounded();
        NodeHandle::new(NodeId(1), tx)
    }

    #[test]
    fn virt_time_advances_monotonically() {
        let mut h = handle();
        assert_eq!(h.advance_virt_time(SimTime(100), 50), SimTime(150));
        // A later-arriving event with an earlier delivered_ts never rewinds.
        assert_eq!(h.advance_virt_time(SimTime(10), 10), SimTime(160));
    }

    #[test]
    fn waiting_toggles_on_terminator_and_delivery() {
        let mut h = handle();
        assert!(!h.is_waiting());
        h.on_event_emitted(true);
        assert!(h.is_waiting());
        h.on_event_delivered();
        assert!(!h.is_waiting());
    }

    #[test]
    fn failure_window_blocks_radio_comm_start() {
        let mut h = handle();
        h.set_fail_time(FailTime::new(10_000_000, 60_000_000).unwrap());
        h.advance_virt_time(SimTime(5_000_000), 0);
        assert!(!h.accepts_radio_comm_start());
        h.advance_virt_time(SimTime(50_000_000), 0);
        assert!(h.accepts_radio_comm_start());
    }

    #[test]
    fn command_times_out_in_virtual_time() {
        let mut h = handle();
        h.begin_command("scan", CommandKind::ExpectResult, 1_000);
        assert!(h.poll_command_timeout().is_none());
        h.advance_virt_time(SimTime(2_000), 0);
        match h.poll_command_timeout() {
            Some(CommandOutcome::TimedOut { .. }) => {}
            other => panic!("expected timeout, got {other:?}"),
        }
    }
}
