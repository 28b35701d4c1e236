use std::io;

use cdp_adapter::AdapterError;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SnapErrKind {
    #[error("screenshot failed: {0}")]
    CaptureFailed(String),
    #[error("screenshot timed out after {0}ms")]
    CaptureTimeout(u64),
    #[error("io failure: {0}")]
    IoFailed(String),
    #[error("serialization failed: {0}")]
    Serialize(String),
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error(transparent)]
pub struct SnapError(pub SnapErrKind);

impl SnapError {
    pub fn new(kind: SnapErrKind) -> Self {
        Self(kind)
    }

    pub fn kind(&self) -> &SnapErrKind {
        &self.0
    }
}

impl From<SnapErrKind> for SnapError {
    fn from(kind: SnapErrKind) -> Self {
        SnapError(kind)
    }
}

impl From<io::Error> for SnapError {
    fn from(err: io::Error) -> Self {
        SnapErrKind::IoFailed(err.to_string()).into()
    }
}

impl From<AdapterError> for SnapError {
    fn from(err: AdapterError) -> Self {
        SnapErrKind::CaptureFailed(err.to_string()).into()
    }
}

impl From<serde_json::Error> for SnapError {
    fn from(err: serde_json::Error) -> Self {
        SnapErrKind::Serialize(err.to_string()).into()
    }
}
