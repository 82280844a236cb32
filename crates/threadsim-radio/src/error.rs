use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RadioError {
    #[error("unknown radio model name: {0}")]
    UnknownModel(String),
}

pub type RadioResult<T> = Result<T, RadioError>;
