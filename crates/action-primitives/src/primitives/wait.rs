//! wait_for - wait for the first match to reach a lifecycle state

use cdp_adapter::ElementState;
use tracewalk_core_types::Step;
use tracing::debug;

use crate::{errors::ActionError, primitives::ActionExecutor, types::Completed, waiting::within};

pub(crate) async fn execute_wait_for(exec: &ActionExecutor, step: &Step) -> Result<Completed, ActionError> {
    let state = match step.input.as_deref() {
        None => ElementState::Visible,
        Some(raw) => raw.parse::<ElementState>()?,
    };

    let query = exec.resolve_query(&step.selector);
    let budget = exec.config().wait_for();
    within(
        "wait_for",
        budget,
        exec.cdp().wait_for_state(exec.page(), &query, state, budget),
    )
    .await?;
    debug!(target: "action-primitives", target = %query, state = state.as_str(), "Wait satisfied");
    Ok(Completed::done())
}
