use serde::{Deserialize, Serialize};
use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PorterError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Tool host unavailable: {0}")]
    HostUnavailable(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Tool execution failed: {0}")]
    ToolExecution(String),

    #[error("Model API error: {0}")]
    ModelApi(String),
}

pub type PorterResult<T> = Result<T, PorterError>;
