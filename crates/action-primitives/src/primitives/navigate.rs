//! goto - navigate to the URL carried in the target's css slot

use tracewalk_core_types::Step;
use tracing::{debug, info};

use crate::{errors::ActionError, primitives::ActionExecutor, types::Completed, waiting::within};

pub(crate) async fn execute_goto(exec: &ActionExecutor, step: &Step) -> Result<Completed, ActionError> {
    let Some(url) = step.selector.navigation_url() else {
        debug!(target: "action-primitives", description = %step.label(), "goto without a url");
        return Ok(Completed::done());
    };

    let budget = exec.config().navigation();
    within("navigation", budget, exec.cdp().navigate(exec.page(), url, budget)).await?;
    info!(target: "action-primitives", url = %url, "Navigated");
    Ok(Completed::done())
}
