//! Soft timeouts around browser operations

use std::future::Future;
use std::time::Duration;

use cdp_adapter::AdapterError;
use tokio::time::timeout;
use tracing::debug;

use crate::errors::ActionError;

/// Runs `op` under `budget`. Expiry abandons the operation and becomes a
/// `WaitTimeout`; adapter errors are mapped by kind.
pub async fn within<T, F>(what: &str, budget: Duration, op: F) -> Result<T, ActionError>
where
    F: Future<Output = Result<T, AdapterError>>,
{
    match timeout(budget, op).await {
        Ok(result) => result.map_err(ActionError::from),
        Err(_) => Err(ActionError::WaitTimeout(format!(
            "{what} exceeded {}ms",
            budget.as_millis()
        ))),
    }
}

/// Like [`within`], but failure is only logged. Returns whether `op` succeeded.
pub async fn best_effort<T, F>(what: &str, budget: Duration, op: F) -> bool
where
    F: Future<Output = Result<T, AdapterError>>,
{
    match within(what, budget, op).await {
        Ok(_) => true,
        Err(err) => {
            debug!(target: "action-primitives", operation = what, error = %err, "best-effort wait gave up");
            false
        }
    }
}

/// Like [`within`], but failure yields `None`.
pub async fn probe<T, F>(what: &str, budget: Duration, op: F) -> Option<T>
where
    F: Future<Output = Result<T, AdapterError>>,
{
    match within(what, budget, op).await {
        Ok(value) => Some(value),
        Err(err) => {
            debug!(target: "action-primitives", operation = what, error = %err, "probe failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdp_adapter::AdapterErrorKind;

    #[tokio::test(start_paused = true)]
    async fn expiry_becomes_wait_timeout() {
        let started = tokio::time::Instant::now();
        let result: Result<(), _> = within(
            "click",
            Duration::from_millis(6_000),
            never_finishes(),
        )
        .await;
        assert!(matches!(result, Err(ActionError::WaitTimeout(_))));
        assert!(started.elapsed() >= Duration::from_millis(6_000));
    }

    #[tokio::test]
    async fn adapter_errors_keep_their_kind() {
        let result: Result<(), _> = within("hover", Duration::from_secs(1), async {
            Err(AdapterError::new(AdapterErrorKind::TargetNotFound))
        })
        .await;
        assert!(matches!(result, Err(ActionError::AnchorNotFound(_))));
        assert!(!best_effort("hover", Duration::from_secs(1), async {
            Err::<(), _>(AdapterError::internal("gone"))
        })
        .await);
    }

    async fn never_finishes() -> Result<(), AdapterError> {
        std::future::pending().await
    }
}
