//! click - click the first match, retrying once when the page did not move

use tracewalk_core_types::Step;
use tracing::{debug, info, warn};

use crate::{
    errors::ActionError,
    primitives::ActionExecutor,
    types::Completed,
    waiting::{best_effort, probe, within},
};
use cdp_adapter::{ElementQuery, WaitGate};

/// Cheap page fingerprint: URL plus markup length, either possibly unknown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Fingerprint {
    pub url: Option<String>,
    pub content_len: Option<usize>,
}

impl Fingerprint {
    /// True when `after` shows a different URL, or the length known before the
    /// click is no longer what `after` reports (including unreadable).
    pub fn progressed_to(&self, after: &Fingerprint) -> bool {
        let url_changed = matches!((&self.url, &after.url), (Some(a), Some(b)) if a != b);
        let len_changed = matches!(self.content_len, Some(before) if after.content_len != Some(before));
        url_changed || len_changed
    }
}

pub(crate) async fn fingerprint(exec: &ActionExecutor) -> Fingerprint {
    let budget = exec.config().probe();
    let url = probe("url", budget, exec.cdp().current_url(exec.page())).await;
    let content_len = probe("content", budget, exec.cdp().content(exec.page()))
        .await
        .map(|markup| markup.len());
    Fingerprint { url, content_len }
}

async fn scroll_then_click(exec: &ActionExecutor, query: &ElementQuery) -> Result<(), ActionError> {
    let scroll_budget = exec.config().scroll_into_view();
    best_effort(
        "scroll_into_view",
        scroll_budget,
        exec.cdp().scroll_into_view(exec.page(), query, scroll_budget),
    )
    .await;

    let click_budget = exec.config().click();
    within("click", click_budget, exec.cdp().click(exec.page(), query, click_budget)).await
}

pub(crate) async fn execute_click(exec: &ActionExecutor, step: &Step) -> Result<Completed, ActionError> {
    let located = exec.locate(&step.selector).await?;
    if !located.is_present() {
        warn!(target: "action-primitives", description = %step.label(), "Element not found for click");
        return Ok(Completed::skipped("element not found"));
    }
    let query = located.query();

    let before = fingerprint(exec).await;
    scroll_then_click(exec, query).await?;

    let idle_budget = exec.config().click_idle();
    best_effort(
        "click_idle",
        idle_budget,
        exec.cdp().wait_basic(exec.page(), WaitGate::network_idle(), idle_budget),
    )
    .await;

    let after = fingerprint(exec).await;
    if before.progressed_to(&after) {
        info!(target: "action-primitives", description = %step.label(), "Clicked");
        return Ok(Completed::clicked(1));
    }

    debug!(
        target: "action-primitives",
        before = ?before,
        after = ?after,
        "page unchanged after click"
    );
    scroll_then_click(exec, query).await?;
    info!(target: "action-primitives", description = %step.label(), "Clicked (retry)");
    Ok(Completed::clicked(2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::test_support::*;
    use crate::{ActionOutcome, StepExecutor};
    use cdp_adapter::fake::FakeCall;
    use cdp_adapter::{AdapterError, AdapterErrorKind};
    use std::time::Duration;
    use tokio::time::Instant;
    use tracewalk_core_types::TargetSpec;

    fn clicks(calls: &[FakeCall]) -> usize {
        calls
            .iter()
            .filter(|call| matches!(call, FakeCall::Click(_)))
            .count()
    }

    fn accept_all() -> Step {
        step("click").with_selector(TargetSpec::Text("Accept all".into()))
    }

    #[test]
    fn unknown_lengths_do_not_count_as_progress() {
        let before = Fingerprint {
            url: Some("https://a".into()),
            content_len: None,
        };
        let same = before.clone();
        assert!(!before.progressed_to(&same));

        let longer = Fingerprint {
            url: Some("https://a".into()),
            content_len: Some(10),
        };
        assert!(!before.progressed_to(&longer));

        let moved = Fingerprint {
            url: Some("https://b".into()),
            content_len: None,
        };
        assert!(before.progressed_to(&moved));
    }

    #[test]
    fn markup_lost_after_the_click_counts_as_progress() {
        let before = Fingerprint {
            url: Some("https://a".into()),
            content_len: Some(10),
        };
        let unreadable = Fingerprint {
            url: Some("https://a".into()),
            content_len: None,
        };
        assert!(before.progressed_to(&unreadable));
        assert!(!before.progressed_to(&before.clone()));
    }

    #[tokio::test(start_paused = true)]
    async fn fingerprint_losing_markup_counts_as_progress() {
        let (exec, fake) = executor();
        fake.add_element("text=Accept all", 1);
        // the first fingerprint reads the markup; the page goes away with the click
        let before = fingerprint(&exec).await;
        assert!(before.content_len.is_some());
        fake.fail("content", AdapterError::new(AdapterErrorKind::CdpIo));
        let after = fingerprint(&exec).await;
        assert!(before.progressed_to(&after));
    }

    #[tokio::test(start_paused = true)]
    async fn absent_element_is_skipped_without_clicking() {
        let (exec, fake) = executor();
        let report = exec.perform(&accept_all()).await;
        assert!(matches!(report.outcome, ActionOutcome::Skipped { .. }));
        assert_eq!(report.click_attempts, 0);
        assert_eq!(clicks(&fake.calls()), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn click_that_changes_the_page_is_not_retried() {
        let (exec, fake) = executor();
        fake.add_element("text=Accept all", 1);
        fake.on_click_content("text=Accept all", "<html><body>accepted</body></html>");
        let report = exec.perform(&accept_all()).await;
        assert_eq!(report.outcome, ActionOutcome::Done);
        assert_eq!(report.click_attempts, 1);
        assert_eq!(clicks(&fake.calls()), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unchanged_page_gets_exactly_one_retry() {
        let (exec, fake) = executor();
        fake.add_element("text=Accept all", 1);
        let report = exec.perform(&accept_all()).await;
        assert_eq!(report.outcome, ActionOutcome::Done);
        assert_eq!(report.click_attempts, 2);
        let calls = fake.calls();
        assert_eq!(clicks(&calls), 2);
        assert!(calls.contains(&FakeCall::WaitBasic(WaitGate::network_idle())));
    }

    #[tokio::test(start_paused = true)]
    async fn unreadable_markup_also_retries() {
        let (exec, fake) = executor();
        fake.add_element("text=Accept all", 1);
        fake.fail("content", AdapterError::new(AdapterErrorKind::CdpIo));
        let report = exec.perform(&accept_all()).await;
        assert_eq!(report.click_attempts, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_click_is_bounded_by_its_budget() {
        let (exec, fake) = executor();
        fake.add_element("text=Accept all", 1);
        fake.stall("click");
        fake.stall("scroll_into_view");
        fake.stall("wait_basic");
        let started = Instant::now();
        let report = exec.perform(&accept_all().with_wait_ms(300)).await;
        assert!(report.outcome.is_failed());
        // scroll 3s + click 6s
        assert!(started.elapsed() <= Duration::from_secs(9) + Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn whole_click_never_exceeds_doubled_budgets() {
        let (exec, fake) = executor();
        fake.add_element("text=Accept all", 1);
        fake.stall("scroll_into_view");
        fake.stall("wait_basic");
        let started = Instant::now();
        let report = exec.perform(&accept_all().with_wait_ms(300)).await;
        assert_eq!(report.click_attempts, 2);
        let cfg = exec.config();
        let bound = Duration::from_millis(
            2 * (cfg.scroll_into_view_ms + cfg.click_ms + cfg.click_idle_ms) + 4 * cfg.probe_ms + cfg.probe_ms + 300,
        );
        assert!(started.elapsed() <= bound);
    }
}
