//! Event wire codec: 19-byte fixed header + per-kind sub-record + raw
//! payload, per SPEC_FULL §4.1. Grounded on `codec.rs`'s push/extend_from_slice
//! encoding idiom and `frame.rs`'s partial-buffer retry contract, adapted
//! from a two-byte length-prefixed frame to the dispatcher's fixed header.

use crate::wire_error::{WireError, WireResult};
use threadsim_core::event::{EventKind, RadioError, SubRecord};
use threadsim_core::{Event, MsgId, NodeId};

/// Size of the fixed wire header: delay(8) + kind(1) + msg_id(8) + len(2).
pub const HEADER_LEN: usize = 19;

/// Fixed byte length of the sub-record for a given kind, or `None` if the
/// kind carries no sub-record (raw payload only).
fn sub_record_len(kind: EventKind) -> Option<usize> {
    use EventKind::*;
    match kind {
        RadioCommStart | RadioRxDone | RadioTxDone | RadioChannelSample => Some(11),
        RadioState => Some(14),
        NodeInfo => Some(4),
        RfsimParamGet | RfsimParamSet | RfsimParamRsp => Some(5),
        UdpToHost | Ip6ToHost | UdpFromHost | Ip6FromHost => Some(36),
        AlarmFired | RadioReceived | UartWrite | RadioSpinelWrite | PostCmd | StatusPush
        | ExtAddr | NodeDisconnected | RadioLog | LogWrite => None,
    }
}

fn encode_sub_record(buf: &mut Vec<u8>, sub: &SubRecord) {
    match *sub {
        SubRecord::RadioComm { channel, tx_power_dbm, error, duration_us } => {
            buf.push(channel);
            buf.push(tx_power_dbm as u8);
            buf.push(error);
            buf.extend_from_slice(&duration_us.to_le_bytes());
        }
        SubRecord::RadioState {
            channel,
            tx_power_dbm,
            rx_sensitivity_dbm,
            energy_state,
            sub_state,
            state,
            radio_time,
        } => {
            buf.push(channel);
            buf.push(tx_power_dbm as u8);
            buf.push(rx_sensitivity_dbm as u8);
            buf.push(energy_state);
            buf.push(sub_state);
            buf.push(state);
            buf.extend_from_slice(&radio_time.to_le_bytes());
        }
        SubRecord::NodeInfo { node_id } => {
            buf.extend_from_slice(&node_id.to_le_bytes());
        }
        SubRecord::RfsimParam { param, value } => {
            buf.push(param);
            buf.extend_from_slice(&value.to_le_bytes());
        }
        SubRecord::HostEndpoint { src_port, dst_port, src_ip6, dst_ip6 } => {
            buf.extend_from_slice(&src_port.to_le_bytes());
            buf.extend_from_slice(&dst_port.to_le_bytes());
            buf.extend_from_slice(&src_ip6);
            buf.extend_from_slice(&dst_ip6);
        }
    }
}

fn decode_sub_record(kind: EventKind, data: &[u8]) -> Option<SubRecord> {
    Some(match kind {
        EventKind::RadioCommStart
        | EventKind::RadioRxDone
        | EventKind::RadioTxDone
        | EventKind::RadioChannelSample => SubRecord::RadioComm {
            channel: data[0],
            tx_power_dbm: data[1] as i8,
            error: data[2],
            duration_us: u64::from_le_bytes(data[3..11].try_into().ok()?),
        },
        EventKind::RadioState => SubRecord::RadioState {
            channel: data[0],
            tx_power_dbm: data[1] as i8,
            rx_sensitivity_dbm: data[2] as i8,
            energy_state: data[3],
            sub_state: data[4],
            state: data[5],
            radio_time: u64::from_le_bytes(data[6..14].try_into().ok()?),
        },
        EventKind::NodeInfo => SubRecord::NodeInfo {
            node_id: i32::from_le_bytes(data[0..4].try_into().ok()?),
        },
        EventKind::RfsimParamGet | EventKind::RfsimParamSet | EventKind::RfsimParamRsp => {
            SubRecord::RfsimParam {
                param: data[0],
                value: i32::from_le_bytes(data[1..5].try_into().ok()?),
            }
        }
        EventKind::UdpToHost | EventKind::Ip6ToHost | EventKind::UdpFromHost | EventKind::Ip6FromHost => {
            SubRecord::HostEndpoint {
                src_port: u16::from_le_bytes(data[0..2].try_into().ok()?),
                dst_port: u16::from_le_bytes(data[2..4].try_into().ok()?),
                src_ip6: data[4..20].try_into().ok()?,
                dst_ip6: data[20..36].try_into().ok()?,
            }
        }
        _ => return None,
    })
}

/// Encodes an event to the wire format. The absolute `timestamp` field is
/// never serialized; the recipient applies `delay_us` to its own clock.
pub fn encode_event(event: &Event) -> WireResult<Vec<u8>> {
    let mut sub_bytes = Vec::new();
    if let Some(sub) = &event.sub_record {
        encode_sub_record(&mut sub_bytes, sub);
    }

    let total_payload_len = sub_bytes.len() + event.payload.len();
    if total_payload_len > u16::MAX as usize {
        return Err(WireError::PayloadTooLong { len: total_payload_len, max: u16::MAX as usize });
    }

    let mut buf = Vec::with_capacity(HEADER_LEN + total_payload_len);
    buf.extend_from_slice(&event.delay_us.to_le_bytes());
    buf.push(event.kind as u8);
    buf.extend_from_slice(&event.msg_id.0.to_le_bytes());
    buf.extend_from_slice(&(total_payload_len as u16).to_le_bytes());
    buf.extend_from_slice(&sub_bytes);
    buf.extend_from_slice(&event.payload);
    Ok(buf)
}

/// Attempts to decode one event from the front of `data`, tagging it with
/// the originating `node`. Returns `None` (not an error) when `data` holds
/// less than a full frame — the transport must retry with more bytes.
pub fn decode_event(data: &[u8], node: NodeId) -> WireResult<Option<(Event, usize)>> {
    if data.len() < HEADER_LEN {
        return Ok(None);
    }

    let delay_us = u64::from_le_bytes(data[0..8].try_into().unwrap());
    let kind_byte = data[8];
    let kind = EventKind::from_u8(kind_byte).ok_or(WireError::UnknownKind(kind_byte))?;
    let msg_id = u64::from_le_bytes(data[9..17].try_into().unwrap());
    let payload_len = u16::from_le_bytes(data[17..19].try_into().unwrap()) as usize;

    let frame_len = HEADER_LEN + payload_len;
    if data.len() < frame_len {
        return Ok(None);
    }

    let body = &data[HEADER_LEN..frame_len];
    let sub_len = sub_record_len(kind).unwrap_or(0);
    let (sub_record, payload) = if sub_len > 0 {
        if body.len() < sub_len {
            return Ok(None);
        }
        (decode_sub_record(kind, &body[..sub_len]), body[sub_len..].to_vec())
    } else {
        (None, body.to_vec())
    };

    let event = Event {
        kind,
        msg_id: MsgId(msg_id),
        delay_us,
        timestamp: threadsim_core::SimTime::ZERO,
        node,
        sub_record,
        payload,
    };
    Ok(Some((event, frame_len)))
}

/// Convenience used by interference/error-corruption logic in
/// threadsim-radio: rewrites the `error` field of a [`SubRecord::RadioComm`]
/// in place, leaving everything else untouched.
pub fn set_radio_comm_error(sub: &mut SubRecord, error: RadioError) {
    if let SubRecord::RadioComm { error: e, .. } = sub {
        *e = error as u8;
    }
}
