//! Core event model for the threadsim dispatcher: the `Event` record,
//! wire-stable kind taxonomy, the deterministic event queue, and the
//! process-wide counter bank. See SPEC_FULL.md §3, §4.2, §9.

pub mod counters;
pub mod error;
pub mod event;
pub mod queue;
pub mod time;

pub use counters::{CounterName, Counters};
pub use error::{CoreError, CoreResult};
pub use event::{Event, EventKind, RadioError, SubRecord};
pub use queue::EventQueue;
pub use time::{MsgId, NodeId, SimTime};
