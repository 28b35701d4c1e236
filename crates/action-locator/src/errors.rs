//! Error types for the locator

use cdp_adapter::{AdapterError, AdapterErrorKind};
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum LocatorError {
    /// Nothing on the page matches the target.
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// The page could not be asked.
    #[error("CDP error: {0}")]
    CdpError(String),

    #[error("Resolution timeout: {0}")]
    Timeout(String),
}

impl LocatorError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, LocatorError::Timeout(_) | LocatorError::CdpError(_))
    }

    /// 0=low, 1=medium, 2=high
    pub fn severity(&self) -> u8 {
        match self {
            LocatorError::CdpError(_) | LocatorError::Timeout(_) => 2,
            LocatorError::ElementNotFound(_) => 1,
        }
    }
}

impl From<AdapterError> for LocatorError {
    fn from(err: AdapterError) -> Self {
        match err.kind {
            AdapterErrorKind::TargetNotFound => LocatorError::ElementNotFound(err.to_string()),
            _ if err.is_timeout() => LocatorError::Timeout(err.to_string()),
            _ => LocatorError::CdpError(err.to_string()),
        }
    }
}
