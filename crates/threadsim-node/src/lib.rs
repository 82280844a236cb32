//! Per-child `NodeHandle` state: virtual time, failure schedule, watch
//! level, and the `Command`/`CommandExpectNone` surface (SPEC_FULL §4.4).

pub mod command;
pub mod error;
pub mod fail_time;
pub mod handle;

pub use command::{CommandKind, CommandOutcome, PendingCommand};
pub use error::{NodeError, NodeResult};
pub use fail_time::FailTime;
pub use handle::{NodeHandle, RadioPowerState, WatchLevel};
