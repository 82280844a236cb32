use thiserror::Error;
use threadsim_core::NodeId;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no such node: {id}")]
    NodeNotFound { id: NodeId },
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },
    #[error("command on {id} timed out after {elapsed_us}us")]
    CommandTimeout { id: NodeId, elapsed_us: u64 },
    #[error("child for node {id} exited unexpectedly")]
    ChildExited { id: NodeId },
    #[error("dispatcher is stopping; command interrupted")]
    CommandInterrupted,
    #[error(transparent)]
    Wire(#[from] threadsim_wire::WireError),
    #[error(transparent)]
    Radio(#[from] threadsim_radio::RadioError),
    #[error(transparent)]
    Node(#[from] threadsim_node::NodeError),
}

pub type DispatchResult<T> = Result<T, DispatchError>;
