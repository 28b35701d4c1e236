//! Run error types

use thiserror::Error;
use tracewalk_snapshot_store::SnapError;

/// Errors surfaced once the loop has finished
#[derive(Debug, Error)]
pub enum FlowError {
    /// The trace could not be persisted
    #[error("Failed to persist trace: {0}")]
    PersistFailed(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<SnapError> for FlowError {
    fn from(err: SnapError) -> Self {
        FlowError::PersistFailed(err.to_string())
    }
}
