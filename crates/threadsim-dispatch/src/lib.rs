//! The threadsim dispatcher: the single-threaded dispatch core
//! ([`core::Dispatcher`]), its threaded driver ([`driver::DispatchDriver`]),
//! the speed governor, and the watchdog (SPEC_FULL §4.5, §5, §6).

pub mod collectors;
pub mod core;
pub mod driver;
pub mod error;
pub mod governor;
pub mod persist;
pub mod visualizer;
pub mod watchdog;

pub use collectors::{CoapMessageRecord, Collectors, JoinRecord, PingRecord};
pub use core::{Dispatcher, DispatcherState, NodeConfig};
pub use driver::{DispatchDriver, GoOutcome};
pub use error::{DispatchError, DispatchResult};
pub use governor::{Speed, SpeedGovernor};
pub use persist::{FrameCapture, ReplayLogWriter};
pub use visualizer::{DeviceRole, LoggingVisualizer, PartitionId, Visualizer};
