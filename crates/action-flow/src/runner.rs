//! Step runner implementation

use std::path::PathBuf;
use std::sync::Arc;

use action_primitives::StepExecutor;
use chrono::Utc;
use perceiver_structural::PageObserver;
use tokio::time::Instant;
use tracewalk_core_types::{Plan, RunTrace, StepRecord};
use tracewalk_snapshot_store::{CaptureGuard, TraceWriter};
use tracing::{info, warn};

use crate::errors::FlowError;
use crate::types::{RunSummary, RunnerConfig};

/// Runs plans against one page.
///
/// Owns the per-run state: the observer's signature slot and the guard's
/// memory and counter. Build a fresh runner for every run.
pub struct StepRunner {
    executor: Arc<dyn StepExecutor>,
    observer: Box<dyn PageObserver>,
    guard: CaptureGuard,
    config: RunnerConfig,
}

impl StepRunner {
    pub fn new(
        executor: Arc<dyn StepExecutor>,
        observer: Box<dyn PageObserver>,
        guard: CaptureGuard,
        config: RunnerConfig,
    ) -> Self {
        Self {
            executor,
            observer,
            guard,
            config,
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Executes up to `max_steps` steps of `plan`, strictly in order.
    ///
    /// Always yields exactly `min(plan.len(), max_steps)` records.
    pub async fn run(&mut self, app: &str, task: &str, plan: &Plan) -> (RunTrace, RunSummary) {
        let started_at = Utc::now();
        let start = Instant::now();
        let total = plan.len();
        let budget = total.min(self.config.max_steps);
        let mut trace = RunTrace::new(app, task);
        let mut actions_failed = 0;
        let mut degraded_steps = 0;

        info!(target: "action-flow", app, task, planned = total, budget, "Starting run");

        for (offset, step) in plan.steps.iter().take(budget).enumerate() {
            let index = offset + 1;
            let description = step.label();
            info!(
                target: "action-flow",
                step = index,
                of = budget,
                action = %step.action,
                description = %description,
                "Step"
            );

            let report = self.executor.perform(step).await;
            if report.outcome.is_failed() {
                actions_failed += 1;
            }

            match self.observer.detect().await {
                Ok(state) => {
                    let do_capture =
                        step.capture_hint || state.significant || index == 1 || index == total;
                    let screenshot = if do_capture {
                        self.capture(app, task, &description).await
                    } else {
                        None
                    };

                    let mut record = StepRecord::observed(index, step, state.timestamp);
                    record.url = Some(state.url);
                    record.has_modal = Some(state.has_modal);
                    record.has_overlay = Some(state.has_overlay);
                    record.screenshot = screenshot;
                    record.outcome = Some(report.outcome.status());
                    trace.push(record);
                }
                Err(err) => {
                    degraded_steps += 1;
                    warn!(
                        target: "action-flow",
                        step = index,
                        description = %description,
                        error = %err,
                        "Step could not be observed"
                    );
                    let screenshot = self
                        .capture(app, task, &format!("step-{index}-error"))
                        .await;
                    let mut record = StepRecord::degraded(index, step, err.to_string());
                    record.screenshot = screenshot;
                    trace.push(record);
                }
            }
        }

        let summary = RunSummary {
            steps_recorded: trace.len(),
            screenshots_captured: trace.screenshots(),
            actions_failed,
            degraded_steps,
            started_at,
            finished_at: Utc::now(),
            latency_ms: start.elapsed().as_millis() as u64,
        };
        (trace, summary)
    }

    async fn capture(&mut self, app: &str, task: &str, description: &str) -> Option<PathBuf> {
        match self.guard.capture(app, task, description).await {
            Ok(path) => path,
            Err(err) => {
                warn!(
                    target: "action-flow",
                    description,
                    error = %err,
                    "Screenshot failed"
                );
                None
            }
        }
    }
}

/// Persists the trace and logs the run totals.
pub fn complete_run(
    writer: &dyn TraceWriter,
    trace: &RunTrace,
    summary: &RunSummary,
) -> Result<PathBuf, FlowError> {
    let path = writer.write(trace)?;
    info!(
        target: "action-flow",
        metadata = %path.display(),
        latency_ms = summary.latency_ms,
        "Workflow complete: {} steps recorded, {} screenshots captured",
        summary.steps_recorded,
        summary.screenshots_captured
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_primitives::{ActionExecutor, ExecutorConfig};
    use async_trait::async_trait;
    use cdp_adapter::fake::{FakeCall, FakePage};
    use cdp_adapter::{AdapterError, AdapterErrorKind, PageId};
    use perceiver_structural::{DetectError, DetectorConfig, PageState, StateDetector};
    use std::path::Path;
    use tracewalk_core_types::{ActionKind, ActionStatus, Step, TargetSpec};
    use tracewalk_snapshot_store::JsonTraceWriter;

    fn runner(fake: &Arc<FakePage>, root: &Path, max_steps: usize) -> StepRunner {
        let page = PageId::new();
        let executor = ActionExecutor::new(fake.clone(), page, ExecutorConfig::default());
        let detector = StateDetector::new(fake.clone(), page, DetectorConfig::default());
        let guard = CaptureGuard::new(fake.clone(), page, root);
        StepRunner::new(
            Arc::new(executor),
            Box::new(detector),
            guard,
            RunnerConfig { max_steps },
        )
    }

    fn scroll(desc: &str) -> Step {
        Step::new(ActionKind::Scroll, desc).with_input("0")
    }

    fn screenshots(fake: &FakePage) -> usize {
        fake.calls()
            .iter()
            .filter(|c| matches!(c, FakeCall::Screenshot))
            .count()
    }

    /// Observer that never reports anything worth a screenshot.
    struct Calm;

    #[async_trait]
    impl PageObserver for Calm {
        async fn detect(&mut self) -> Result<PageState, DetectError> {
            Ok(PageState {
                url: "https://notion.so".into(),
                has_modal: false,
                has_overlay: false,
                content_signature: None,
                changed: false,
                significant: false,
                timestamp: Utc::now(),
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn record_count_is_capped_by_max_steps() {
        let dir = tempfile::tempdir().unwrap();
        let fake = Arc::new(FakePage::new());
        let plan = Plan::new((1..=5).map(|i| scroll(&format!("scroll {i}"))).collect());

        let (trace, summary) = runner(&fake, dir.path(), 3).run("notion", "t", &plan).await;
        assert_eq!(trace.len(), 3);
        assert_eq!(summary.steps_recorded, 3);
        let indices: Vec<_> = trace.steps.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);

        let (trace, _) = runner(&fake, dir.path(), 20).run("notion", "t", &plan).await;
        assert_eq!(trace.len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_plan_yields_empty_trace() {
        let dir = tempfile::tempdir().unwrap();
        let fake = Arc::new(FakePage::new());
        let (trace, summary) = runner(&fake, dir.path(), 20)
            .run("trello", "nothing", &Plan::default())
            .await;
        assert!(trace.is_empty());
        assert_eq!(summary.screenshots_captured, 0);
        assert!(fake.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn first_step_captures_and_quiet_steps_do_not() {
        let dir = tempfile::tempdir().unwrap();
        let fake = Arc::new(FakePage::new());
        let plan = Plan::new(vec![scroll("one"), scroll("two"), scroll("three")]);

        let (trace, summary) = runner(&fake, dir.path(), 20).run("linear", "t", &plan).await;
        assert!(trace.steps[0].has_screenshot());
        assert!(!trace.steps[1].has_screenshot());
        // the last step is attempted but the page has not changed
        assert!(!trace.steps[2].has_screenshot());
        assert_eq!(summary.screenshots_captured, 1);
        assert_eq!(screenshots(&fake), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn last_step_of_full_plan_forces_capture() {
        let dir = tempfile::tempdir().unwrap();
        let fake = Arc::new(FakePage::new());
        fake.add_element("css=#more", 1);
        fake.on_click_content("css=#more", "<html><body>more rows</body></html>");
        fake.add_element("css=#last", 1);
        fake.on_click_content("css=#last", "<html><body>final rows</body></html>");

        let page = PageId::new();
        let executor = ActionExecutor::new(fake.clone(), page, ExecutorConfig::default());
        let guard = CaptureGuard::new(fake.clone(), page, dir.path());
        let mut runner = StepRunner::new(
            Arc::new(executor),
            Box::new(Calm),
            guard,
            RunnerConfig::default(),
        );
        let plan = Plan::new(vec![
            scroll("start"),
            Step::new(ActionKind::Click, "Load more").with_selector(TargetSpec::Css("#more".into())),
            Step::new(ActionKind::Click, "Load last").with_selector(TargetSpec::Css("#last".into())),
        ]);

        let (trace, _) = runner.run("notion", "t", &plan).await;
        assert!(trace.steps[0].has_screenshot());
        assert!(!trace.steps[1].has_screenshot());
        let last = trace.steps[2].screenshot.as_ref().expect("last step captured");
        assert!(last.ends_with("step-02-load-last.png"));
    }

    #[tokio::test(start_paused = true)]
    async fn capture_hint_requests_screenshot() {
        let dir = tempfile::tempdir().unwrap();
        let fake = Arc::new(FakePage::new());
        fake.add_element("css=#next", 1);
        fake.on_click_content("css=#next", "<html><body>next</body></html>");

        let page = PageId::new();
        let executor = ActionExecutor::new(fake.clone(), page, ExecutorConfig::default());
        let guard = CaptureGuard::new(fake.clone(), page, dir.path());
        let mut runner =
            StepRunner::new(Arc::new(executor), Box::new(Calm), guard, RunnerConfig::default());
        let plan = Plan::new(vec![
            scroll("start"),
            Step::new(ActionKind::Click, "Next")
                .with_selector(TargetSpec::Css("#next".into()))
                .with_capture_hint(true),
            scroll("idle"),
            scroll("end"),
        ]);

        let (trace, _) = runner.run("notion", "t", &plan).await;
        assert!(trace.steps[1].has_screenshot());
        assert!(!trace.steps[2].has_screenshot());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_actions_are_recorded_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let fake = Arc::new(FakePage::new());
        let plan = Plan::new(vec![Step::new(ActionKind::Scroll, "Bad scroll").with_input("down")]);

        let (trace, summary) = runner(&fake, dir.path(), 20).run("trello", "t", &plan).await;
        assert_eq!(trace.steps[0].outcome, Some(ActionStatus::Failed));
        assert_eq!(trace.steps[0].error, None);
        assert_eq!(summary.actions_failed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unobservable_step_is_degraded() {
        let dir = tempfile::tempdir().unwrap();
        let fake = Arc::new(FakePage::new());
        for op in ["current_url", "count", "content"] {
            fake.fail(op, AdapterError::new(AdapterErrorKind::CdpIo));
        }
        let plan = Plan::new(vec![scroll("one"), scroll("two")]);

        let (trace, summary) = runner(&fake, dir.path(), 20).run("linear", "t", &plan).await;
        assert_eq!(trace.len(), 2);
        assert_eq!(summary.degraded_steps, 2);
        let first = &trace.steps[0];
        assert!(first.error.as_deref().unwrap().contains("page unavailable"));
        assert!(first.url.is_none());
        assert!(first.outcome.is_none());
        assert!(first
            .screenshot
            .as_ref()
            .unwrap()
            .ends_with("step-01-step-1-error.png"));
    }

    #[tokio::test(start_paused = true)]
    async fn degraded_step_without_fallback_screenshot() {
        let dir = tempfile::tempdir().unwrap();
        let fake = Arc::new(FakePage::new());
        for op in ["current_url", "count", "content", "screenshot"] {
            fake.fail(op, AdapterError::new(AdapterErrorKind::CdpIo));
        }
        let plan = Plan::new(vec![scroll("one")]);

        let (trace, summary) = runner(&fake, dir.path(), 20).run("linear", "t", &plan).await;
        assert_eq!(trace.steps[0].screenshot, None);
        assert!(trace.steps[0].error.is_some());
        assert_eq!(summary.screenshots_captured, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn completed_run_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let fake = Arc::new(FakePage::new());
        let plan = Plan::new(vec![scroll("only")]);
        let (trace, summary) = runner(&fake, dir.path(), 20)
            .run("notion", "Create page", &plan)
            .await;

        let writer = JsonTraceWriter::new(dir.path());
        let path = complete_run(&writer, &trace, &summary).unwrap();
        assert_eq!(path, dir.path().join("notion/create-page/metadata.json"));
        let value: serde_json::Value =
            serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap();
        assert_eq!(value["steps"][0]["outcome"], "ok");
    }
}
