use thiserror::Error;

/// Errors raised while turning planner output into a [`crate::Plan`].
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("plan is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read plan: {0}")]
    Io(#[from] std::io::Error),
}
