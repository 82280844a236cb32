//! The `Event` record and its wire-stable kind/sub-record taxonomy.

use crate::time::{MsgId, NodeId, SimTime};
use serde::{Deserialize, Serialize};

/// Wire-stable event kinds. Discriminants are part of the child-process
/// wire protocol (threadsim-wire) and must never be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventKind {
    AlarmFired = 0,
    RadioReceived = 1,
    UartWrite = 2,
    RadioSpinelWrite = 3,
    PostCmd = 4,
    StatusPush = 5,
    RadioCommStart = 6,
    RadioTxDone = 7,
    RadioChannelSample = 8,
    RadioState = 9,
    RadioRxDone = 10,
    ExtAddr = 11,
    NodeInfo = 12,
    NodeDisconnected = 13,
    RadioLog = 14,
    RfsimParamGet = 15,
    RfsimParamSet = 16,
    RfsimParamRsp = 17,
    LogWrite = 18,
    UdpToHost = 19,
    Ip6ToHost = 20,
    UdpFromHost = 21,
    Ip6FromHost = 22,
}

impl EventKind {
    pub const ALL: &'static [EventKind] = &[
        EventKind::AlarmFired,
        EventKind::RadioReceived,
        EventKind::UartWrite,
        EventKind::RadioSpinelWrite,
        EventKind::PostCmd,
        EventKind::StatusPush,
        EventKind::RadioCommStart,
        EventKind::RadioTxDone,
        EventKind::RadioChannelSample,
        EventKind::RadioState,
        EventKind::RadioRxDone,
        EventKind::ExtAddr,
        EventKind::NodeInfo,
        EventKind::NodeDisconnected,
        EventKind::RadioLog,
        EventKind::RfsimParamGet,
        EventKind::RfsimParamSet,
        EventKind::RfsimParamRsp,
        EventKind::LogWrite,
        EventKind::UdpToHost,
        EventKind::Ip6ToHost,
        EventKind::UdpFromHost,
        EventKind::Ip6FromHost,
    ];

    pub const fn from_u8(v: u8) -> Option<EventKind> {
        Some(match v {
            0 => EventKind::AlarmFired,
            1 => EventKind::RadioReceived,
            2 => EventKind::UartWrite,
            3 => EventKind::RadioSpinelWrite,
            4 => EventKind::PostCmd,
            5 => EventKind::StatusPush,
            6 => EventKind::RadioCommStart,
            7 => EventKind::RadioTxDone,
            8 => EventKind::RadioChannelSample,
            9 => EventKind::RadioState,
            10 => EventKind::RadioRxDone,
            11 => EventKind::ExtAddr,
            12 => EventKind::NodeInfo,
            13 => EventKind::NodeDisconnected,
            14 => EventKind::RadioLog,
            15 => EventKind::RfsimParamGet,
            16 => EventKind::RfsimParamSet,
            17 => EventKind::RfsimParamRsp,
            18 => EventKind::LogWrite,
            19 => EventKind::UdpToHost,
            20 => EventKind::Ip6ToHost,
            21 => EventKind::UdpFromHost,
            22 => EventKind::Ip6FromHost,
            _ => return None,
        })
    }

    /// Whether this kind terminates a node's current burst of output,
    /// making the dispatcher consider the node "waiting" (SPEC_FULL §4.4).
    pub const fn is_waiting_terminator(self) -> bool {
        matches!(self, EventKind::AlarmFired | EventKind::StatusPush)
    }

    pub const fn is_radio(self) -> bool {
        matches!(
            self,
            EventKind::RadioReceived
                | EventKind::RadioCommStart
                | EventKind::RadioTxDone
                | EventKind::RadioChannelSample
                | EventKind::RadioState
                | EventKind::RadioRxDone
        )
    }
}

/// Radio delivery error code carried in [`SubRecord::RadioComm`] and
/// [`SubRecord::RadioState`] `error` fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum RadioError {
    None = 0,
    Fcs = 1,
    Abort = 2,
    NoAck = 3,
    CcaBusy = 4,
}

impl RadioError {
    pub const fn from_u8(v: u8) -> RadioError {
        match v {
            0 => RadioError::None,
            1 => RadioError::Fcs,
            2 => RadioError::Abort,
            3 => RadioError::NoAck,
            _ => RadioError::CcaBusy,
        }
    }
}

/// Fixed-layout typed sub-record that precedes the raw payload bytes for
/// composite event kinds (SPEC_FULL §4.1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SubRecord {
    /// radio-comm-start, radio-rx-done, radio-tx-done, radio-channel-sample
    RadioComm {
        channel: u8,
        tx_power_dbm: i8,
        error: u8,
        duration_us: u64,
    },
    /// radio-state
    RadioState {
        channel: u8,
        tx_power_dbm: i8,
        rx_sensitivity_dbm: i8,
        energy_state: u8,
        sub_state: u8,
        state: u8,
        radio_time: u64,
    },
    /// node-info
    NodeInfo { node_id: i32 },
    /// rfsim-param-get/set/rsp
    RfsimParam { param: u8, value: i32 },
    /// udp/ip6-to/from-host
    HostEndpoint {
        src_port: u16,
        dst_port: u16,
        src_ip6: [u8; 16],
        dst_ip6: [u8; 16],
    },
}

/// The atomic unit exchanged between node and dispatcher (SPEC_FULL §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    /// Per-node monotonically increasing id, the primary ordering tie-break.
    pub msg_id: MsgId,
    /// Delay in microseconds from the sender's virtual time at emission.
    pub delay_us: u64,
    /// Absolute timestamp, filled in by the dispatcher at ingress.
    pub timestamp: SimTime,
    /// Node that authored (for outgoing) or is the target of (for
    /// incoming) this event.
    pub node: NodeId,
    pub sub_record: Option<SubRecord>,
    pub payload: Vec<u8>,
}

impl Event {
    pub fn new(kind: EventKind, node: NodeId, msg_id: MsgId, delay_us: u64) -> Self {
        Event {
            kind,
            msg_id,
            delay_us,
            timestamp: SimTime::ZERO,
            node,
            sub_record: None,
            payload: Vec::new(),
        }
    }

    pub fn with_sub_record(mut self, sub: SubRecord) -> Self {
        self.sub_record = Some(sub);
        self
    }

    pub fn with_payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = payload;
        self
    }

    /// Resolve an absolute timestamp from the emitting node's current
    /// virtual time, per the time-sync handshake (SPEC_FULL §4.4).
    pub fn resolve_timestamp(&mut self, node_virt_time: SimTime) {
        self.timestamp = node_virt_time.plus_delay(self.delay_us);
    }
}
