//! Errors for the Event wire codec (distinct from the legacy packet-level
//! `PacketError` in `error.rs`, which belongs to dropped MeshCore-specific
//! packet framing — see DESIGN.md "Dropped dependencies").

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("unknown event kind byte: 0x{0:02X}")]
    UnknownKind(u8),

    #[error("payload length {len} exceeds the 16-bit wire limit of {max}")]
    PayloadTooLong { len: usize, max: usize },
}

pub type WireResult<T> = Result<T, WireError>;
