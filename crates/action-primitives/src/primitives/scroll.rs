//! scroll - vertical mouse wheel by the step input

use tracewalk_core_types::Step;
use tracing::debug;

use crate::{errors::ActionError, primitives::ActionExecutor, types::Completed, waiting::within};

pub(crate) async fn execute_scroll(exec: &ActionExecutor, step: &Step) -> Result<Completed, ActionError> {
    let delta_y = match step.input.as_deref() {
        None => exec.config().default_scroll_px,
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map_err(|_| ActionError::InvalidInput(format!("scroll distance '{raw}' is not an integer")))?,
    };

    within(
        "scroll",
        exec.config().probe(),
        exec.cdp().mouse_wheel(exec.page(), 0.0, delta_y as f64),
    )
    .await?;
    debug!(target: "action-primitives", delta_y, "Scrolled");
    Ok(Completed::done())
}

#[cfg(test)]
mod tests {
    use crate::primitives::test_support::*;
    use crate::{ActionError, ActionOutcome, StepExecutor};
    use cdp_adapter::fake::FakeCall;

    #[tokio::test(start_paused = true)]
    async fn defaults_to_one_screen() {
        let (exec, fake) = executor();
        exec.perform(&step("scroll")).await;
        assert_eq!(fake.calls(), vec![FakeCall::Wheel(0.0, 800.0)]);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_scroll_still_dispatches() {
        let (exec, fake) = executor();
        let report = exec.perform(&step("scroll").with_input("0")).await;
        assert_eq!(report.outcome, ActionOutcome::Done);
        assert_eq!(fake.calls(), vec![FakeCall::Wheel(0.0, 0.0)]);
    }

    #[tokio::test(start_paused = true)]
    async fn non_integer_input_fails_without_scrolling() {
        let (exec, fake) = executor();
        let report = exec.perform(&step("scroll").with_input("12.5")).await;
        assert!(matches!(
            report.outcome,
            ActionOutcome::Failed {
                error: ActionError::InvalidInput(_)
            }
        ));
        assert!(fake.calls().is_empty());
    }
}
