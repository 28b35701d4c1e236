use async_trait::async_trait;

use crate::errors::DetectError;
use crate::model::PageState;

/// Observes the page after an action.
///
/// Observers keep single-slot memory between calls, hence `&mut self`.
#[async_trait]
pub trait PageObserver: Send {
    async fn detect(&mut self) -> Result<PageState, DetectError>;
}
