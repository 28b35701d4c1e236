use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DetectError {
    /// Every probe failed; the page is gone or the connection is.
    #[error("page unavailable: {0}")]
    PageUnavailable(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl DetectError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
