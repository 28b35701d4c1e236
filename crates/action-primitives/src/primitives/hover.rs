//! hover - move the pointer over the first match

use tracewalk_core_types::Step;
use tracing::{info, warn};

use crate::{errors::ActionError, primitives::ActionExecutor, types::Completed, waiting::within};

pub(crate) async fn execute_hover(exec: &ActionExecutor, step: &Step) -> Result<Completed, ActionError> {
    let located = exec.locate(&step.selector).await?;
    if !located.is_present() {
        warn!(target: "action-primitives", description = %step.label(), "Element not found for hover");
        return Ok(Completed::skipped("element not found"));
    }

    let budget = exec.config().hover();
    within("hover", budget, exec.cdp().hover(exec.page(), located.query(), budget)).await?;
    info!(target: "action-primitives", target = %located.query(), "Hovered");
    Ok(Completed::done())
}

#[cfg(test)]
mod tests {
    use crate::primitives::test_support::*;
    use crate::{ActionOutcome, StepExecutor};
    use cdp_adapter::fake::FakeCall;
    use tracewalk_core_types::TargetSpec;

    #[tokio::test(start_paused = true)]
    async fn hovers_first_match() {
        let (exec, fake) = executor();
        fake.add_element("text=Menu", 3);
        let report = exec
            .perform(&step("hover").with_selector(TargetSpec::Text("Menu".into())))
            .await;
        assert_eq!(report.outcome, ActionOutcome::Done);
        assert_eq!(fake.calls(), vec![FakeCall::Hover("text=Menu".into())]);
    }

    #[tokio::test(start_paused = true)]
    async fn absent_target_is_skipped() {
        let (exec, fake) = executor();
        let report = exec
            .perform(&step("hover").with_selector(TargetSpec::Text("Menu".into())))
            .await;
        assert!(matches!(report.outcome, ActionOutcome::Skipped { .. }));
        assert!(fake.calls().is_empty());
    }
}
