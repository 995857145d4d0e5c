//! Error types shared across the workspace

use thiserror::Error;

/// Result alias used throughout the controller
pub type AvoidResult<T> = Result<T, AvoidError>;

#[derive(Debug, Error)]
pub enum AvoidError {
    /// The scan is too short to sample every monitored direction
    #[error("malformed scan: {len} ranges, at least {required} required")]
    MalformedScan { len: usize, required: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("communication error: {0}")]
    Communication(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AvoidError {
    /// Per-cycle conditions the host should survive rather than abort on
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AvoidError::MalformedScan { .. } | AvoidError::Communication(_)
        )
    }
}

impl From<serde_json::Error> for AvoidError {
    fn from(err: serde_json::Error) -> Self {
        AvoidError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AvoidError {
    fn from(err: serde_yaml::Error) -> Self {
        AvoidError::Serialization(err.to_string())
    }
}
