//! Action primitives implementation
//!
//! Seven primitives, one per planned action:
//! 1. goto - navigate to the URL carried in the target
//! 2. click - click the first match, retrying once when nothing changed
//! 3. hover - move the pointer over the first match
//! 4. type - keystrokes into the first match or the focused element
//! 5. press - single keys and modifier combos
//! 6. wait_for - wait for the first match to reach a state
//! 7. scroll - vertical mouse wheel

mod click;
mod hover;
mod navigate;
mod press;
mod scroll;
mod type_text;
mod wait;

use std::sync::Arc;
use std::time::Duration;

use action_locator::{ElementResolver, Located, Resolution, SelectorResolver};
use async_trait::async_trait;
use cdp_adapter::{Cdp, ElementQuery, PageId};
use chrono::Utc;
use tokio::time::{sleep, timeout, Instant};
use tracewalk_core_types::{ActionKind, Step, TargetSpec};
use tracing::{info, warn};

use crate::{
    errors::ActionError,
    types::{ActionOutcome, ActionReport, Completed, ExecutorConfig},
};

/// Executes one planned step.
///
/// Implementations never fail: problems end up in
/// [`ActionReport::outcome`] so the run can move on.
#[async_trait]
pub trait StepExecutor: Send + Sync {
    async fn perform(&self, step: &Step) -> ActionReport;
}

/// Executor bound to one page.
pub struct ActionExecutor {
    cdp: Arc<dyn Cdp>,
    page: PageId,
    resolver: Arc<dyn ElementResolver>,
    config: ExecutorConfig,
}

impl ActionExecutor {
    pub fn new(cdp: Arc<dyn Cdp>, page: PageId, config: ExecutorConfig) -> Self {
        Self::with_resolver(cdp, page, config, Arc::new(SelectorResolver::new()))
    }

    pub fn with_resolver(
        cdp: Arc<dyn Cdp>,
        page: PageId,
        config: ExecutorConfig,
        resolver: Arc<dyn ElementResolver>,
    ) -> Self {
        Self {
            cdp,
            page,
            resolver,
            config,
        }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub(crate) fn cdp(&self) -> &dyn Cdp {
        self.cdp.as_ref()
    }

    pub(crate) fn page(&self) -> PageId {
        self.page
    }

    pub(crate) fn resolve(&self, target: &TargetSpec) -> Resolution {
        self.resolver.resolve(target)
    }

    pub(crate) fn resolve_query(&self, target: &TargetSpec) -> ElementQuery {
        self.resolve(target).query
    }

    /// Resolves the step target and counts its matches.
    pub(crate) async fn locate(&self, target: &TargetSpec) -> Result<Located, ActionError> {
        let budget = self.config.probe();
        match timeout(budget, self.resolver.locate(self.cdp(), self.page, target)).await {
            Ok(located) => located.map_err(ActionError::from),
            Err(_) => Err(ActionError::WaitTimeout(format!(
                "locating {} exceeded {}ms",
                target.describe(),
                budget.as_millis()
            ))),
        }
    }

    async fn dispatch(&self, step: &Step) -> Result<Completed, ActionError> {
        match &step.action {
            ActionKind::Goto => navigate::execute_goto(self, step).await,
            ActionKind::Click => click::execute_click(self, step).await,
            ActionKind::Hover => hover::execute_hover(self, step).await,
            ActionKind::Type => type_text::execute_type(self, step).await,
            ActionKind::Press => press::execute_press(self, step).await,
            ActionKind::WaitFor => wait::execute_wait_for(self, step).await,
            ActionKind::Scroll => scroll::execute_scroll(self, step).await,
            ActionKind::Unknown(name) => {
                warn!(
                    target: "action-primitives",
                    action = %name,
                    description = %step.label(),
                    "Unknown action"
                );
                Ok(Completed::skipped(format!("unknown action '{name}'")))
            }
        }
    }
}

#[async_trait]
impl StepExecutor for ActionExecutor {
    async fn perform(&self, step: &Step) -> ActionReport {
        let started_at = Utc::now();
        let start = Instant::now();
        info!(
            target: "action-primitives",
            action = %step.action,
            description = %step.label(),
            "Action"
        );

        let (outcome, click_attempts) = match self.dispatch(step).await {
            Ok(completed) => {
                sleep(Duration::from_millis(step.wait_ms())).await;
                let outcome = match completed.skipped {
                    Some(reason) => ActionOutcome::Skipped { reason },
                    None => ActionOutcome::Done,
                };
                (outcome, completed.click_attempts)
            }
            Err(error) => {
                warn!(
                    target: "action-primitives",
                    action = %step.action,
                    description = %step.label(),
                    error = %error,
                    "Action failed (continuing)"
                );
                (ActionOutcome::Failed { error }, 0)
            }
        };

        ActionReport {
            action: step.action.clone(),
            outcome,
            click_attempts,
            started_at,
            latency_ms: start.elapsed().as_millis() as u64,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use cdp_adapter::fake::FakePage;

    pub fn executor() -> (ActionExecutor, Arc<FakePage>) {
        let fake = Arc::new(FakePage::new());
        let exec = ActionExecutor::new(fake.clone(), PageId::new(), ExecutorConfig::default());
        (exec, fake)
    }

    pub fn step(action: &str) -> Step {
        Step::new(ActionKind::from(action), format!("{action} step"))
    }
}
