//! type - keystrokes into the first match, or into whatever has focus

use tracewalk_core_types::Step;
use tracing::{info, warn};

use crate::{errors::ActionError, primitives::ActionExecutor, types::Completed, waiting::within};

pub(crate) async fn execute_type(exec: &ActionExecutor, step: &Step) -> Result<Completed, ActionError> {
    let text = step.input.as_deref().unwrap_or_default();
    let cfg = exec.config();
    let page = exec.page();

    let resolution = exec.resolve(&step.selector);
    if !resolution.is_root() {
        let located = exec.locate(&step.selector).await?;
        if !located.is_present() {
            warn!(target: "action-primitives", description = %step.label(), "Element not found for type");
            return Ok(Completed::skipped("element not found"));
        }
        let query = located.query();
        within("fill", cfg.fill(), exec.cdp().fill(page, query, "", cfg.fill())).await?;
        within("focus", cfg.fill(), exec.cdp().focus(page, query, cfg.fill())).await?;
    }

    within(
        "type",
        cfg.typing(text),
        exec.cdp().type_text(page, text, cfg.keystroke_delay()),
    )
    .await?;

    let preview: String = text.chars().take(50).collect();
    if resolution.is_root() {
        info!(target: "action-primitives", text = %preview, "Typed into focused element");
    } else {
        info!(target: "action-primitives", text = %preview, target = %resolution.query, "Typed");
    }
    Ok(Completed::done())
}

#[cfg(test)]
mod tests {
    use crate::primitives::test_support::*;
    use crate::{ActionOutcome, StepExecutor};
    use cdp_adapter::fake::FakeCall;
    use std::time::Duration;
    use tokio::time::Instant;
    use tracewalk_core_types::TargetSpec;

    #[tokio::test(start_paused = true)]
    async fn root_target_types_into_focus() {
        let (exec, fake) = executor();
        let started = Instant::now();
        let report = exec.perform(&step("type").with_input("hello").with_wait_ms(0)).await;
        assert_eq!(report.outcome, ActionOutcome::Done);
        assert_eq!(fake.calls(), vec![FakeCall::Type("hello".into())]);
        assert_eq!(fake.typed(), "hello");
        // four gaps of 50ms between five keystrokes
        assert!(started.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn targeted_type_clears_and_focuses_first() {
        let (exec, fake) = executor();
        fake.add_element("placeholder=Search", 1);
        exec.perform(
            &step("type")
                .with_selector(TargetSpec::Placeholder("Search".into()))
                .with_input("roadmap"),
        )
        .await;
        assert_eq!(
            fake.calls(),
            vec![
                FakeCall::Fill("placeholder=Search".into(), String::new()),
                FakeCall::Focus("placeholder=Search".into()),
                FakeCall::Type("roadmap".into()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn absent_target_types_nothing() {
        let (exec, fake) = executor();
        let report = exec
            .perform(
                &step("type")
                    .with_selector(TargetSpec::Label("Email".into()))
                    .with_input("a@b.c"),
            )
            .await;
        assert!(matches!(report.outcome, ActionOutcome::Skipped { .. }));
        assert!(fake.typed().is_empty());
    }
}
