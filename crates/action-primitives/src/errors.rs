//! Error types for action primitives

use cdp_adapter::{AdapterError, AdapterErrorKind};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ActionError {
    /// Navigation did not finish within its budget
    #[error("Navigation timeout: {0}")]
    NavTimeout(String),

    /// A bounded wait expired
    #[error("Wait timeout: {0}")]
    WaitTimeout(String),

    /// Element anchor could not be resolved
    #[error("Anchor not found: {0}")]
    AnchorNotFound(String),

    /// The step's input cannot drive this action
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// CDP communication or protocol error
    #[error("CDP I/O error: {0}")]
    CdpIo(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ActionError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, ActionError::WaitTimeout(_) | ActionError::CdpIo(_))
    }

    /// Get error severity level (0=low, 1=medium, 2=high, 3=critical)
    pub fn severity(&self) -> u8 {
        match self {
            ActionError::Internal(_) => 3,
            ActionError::NavTimeout(_) | ActionError::CdpIo(_) => 2,
            ActionError::WaitTimeout(_) | ActionError::AnchorNotFound(_) => 1,
            ActionError::InvalidInput(_) => 0,
        }
    }
}

impl From<AdapterError> for ActionError {
    fn from(err: AdapterError) -> Self {
        let message = err.to_string();
        match err.kind {
            AdapterErrorKind::TargetNotFound => {
                ActionError::AnchorNotFound(err.hint.unwrap_or(message))
            }
            AdapterErrorKind::NavTimeout => ActionError::NavTimeout(err.hint.unwrap_or(message)),
            AdapterErrorKind::WaitTimeout => ActionError::WaitTimeout(err.hint.unwrap_or(message)),
            AdapterErrorKind::InvalidArgument => {
                ActionError::InvalidInput(err.hint.unwrap_or(message))
            }
            AdapterErrorKind::CdpIo
            | AdapterErrorKind::ScriptException
            | AdapterErrorKind::Internal => ActionError::CdpIo(message),
        }
    }
}

impl From<action_locator::LocatorError> for ActionError {
    fn from(err: action_locator::LocatorError) -> Self {
        use action_locator::LocatorError;
        match err {
            LocatorError::ElementNotFound(detail) => ActionError::AnchorNotFound(detail),
            LocatorError::Timeout(detail) => ActionError::WaitTimeout(detail),
            LocatorError::CdpError(detail) => ActionError::CdpIo(detail),
        }
    }
}
