//! press - single keys and `Mod1+Mod2+Key` combos

use cdp_adapter::keys::split_combo;
use tracewalk_core_types::Step;
use tracing::{debug, warn};

use crate::{errors::ActionError, primitives::ActionExecutor, types::Completed, waiting::within};

const DEFAULT_KEY: &str = "Enter";

pub(crate) async fn execute_press(exec: &ActionExecutor, step: &Step) -> Result<Completed, ActionError> {
    let combo = step
        .input
        .as_deref()
        .filter(|key| !key.is_empty())
        .unwrap_or(DEFAULT_KEY);
    let (modifiers, key) = split_combo(combo);
    let budget = exec.config().probe();
    let page = exec.page();

    let mut held = Vec::with_capacity(modifiers.len());
    let mut result = Ok(());
    for modifier in &modifiers {
        match within("key_down", budget, exec.cdp().key_down(page, modifier)).await {
            Ok(()) => held.push(*modifier),
            Err(err) => {
                result = Err(err);
                break;
            }
        }
    }
    if result.is_ok() {
        result = within("press", budget, exec.cdp().press_key(page, key)).await;
    }
    for modifier in held.iter().rev() {
        if let Err(err) = within("key_up", budget, exec.cdp().key_up(page, modifier)).await {
            warn!(target: "action-primitives", key = %modifier, error = %err, "failed to release modifier");
        }
    }

    result?;
    debug!(target: "action-primitives", combo = %combo, "Pressed");
    Ok(Completed::done())
}

#[cfg(test)]
mod tests {
    use crate::primitives::test_support::*;
    use crate::StepExecutor;
    use cdp_adapter::fake::FakeCall;
    use cdp_adapter::{AdapterError, AdapterErrorKind};

    #[tokio::test(start_paused = true)]
    async fn combo_holds_modifiers_in_listed_order() {
        let (exec, fake) = executor();
        exec.perform(&step("press").with_input("Control+Shift+K")).await;
        assert_eq!(
            fake.calls(),
            vec![
                FakeCall::KeyDown("Control".into()),
                FakeCall::KeyDown("Shift".into()),
                FakeCall::Press("K".into()),
                FakeCall::KeyUp("Shift".into()),
                FakeCall::KeyUp("Control".into()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn missing_input_presses_enter() {
        let (exec, fake) = executor();
        exec.perform(&step("press")).await;
        assert_eq!(fake.calls(), vec![FakeCall::Press("Enter".into())]);
    }

    #[tokio::test(start_paused = true)]
    async fn modifiers_are_released_when_the_key_fails() {
        let (exec, fake) = executor();
        fake.fail("press_key", AdapterError::new(AdapterErrorKind::InvalidArgument));
        let report = exec.perform(&step("press").with_input("Control+n")).await;
        assert!(report.outcome.is_failed());
        assert_eq!(
            fake.calls(),
            vec![FakeCall::KeyDown("Control".into()), FakeCall::KeyUp("Control".into())]
        );
    }
}
