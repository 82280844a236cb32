//! Child-process wire codec: translates [`threadsim_core::Event`] records
//! to and from the length-prefixed byte stream described in SPEC_FULL §4.1.

pub mod frame;
pub mod wire;
pub mod wire_error;

pub use frame::FrameBuffer;
pub use wire::{decode_event, encode_event, set_radio_comm_error, HEADER_LEN};
pub use wire_error::{WireError, WireResult};
