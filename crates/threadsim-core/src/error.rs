//! Error types owned by the core data model.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("event timestamp {ts} precedes dispatcher current time {cur}")]
    TimeTravel { ts: u64, cur: u64 },

    #[error("unknown event kind byte: 0x{0:02X}")]
    UnknownEventKind(u8),
}

pub type CoreResult<T> = Result<T, CoreError>;
