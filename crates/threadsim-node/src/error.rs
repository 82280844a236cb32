use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NodeError {
    #[error("command timed out after {elapsed_us}us")]
    CommandTimeout { elapsed_us: u64 },
    #[error("node is in a failure window")]
    NodeFailed,
    #[error("node is disconnected")]
    NodeDisconnected,
    #[error("invalid failure schedule: duration {duration_us}us must be < interval {interval_us}us")]
    InvalidFailSchedule { duration_us: u64, interval_us: u64 },
}

pub type NodeResult<T> = Result<T, NodeError>;
