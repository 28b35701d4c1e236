use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use action_flow::{complete_run, RunSummary, RunTrace, RunnerConfig, StepRunner};
use action_primitives::ActionExecutor;
use anyhow::{Context, Result};
use cdp_adapter::{Cdp, PageId};
use clap::Args;
use perceiver_structural::StateDetector;
use tracewalk_core_types::Plan;
use tracewalk_snapshot_store::{CaptureGuard, JsonTraceWriter};
use tracing::info;

use super::context::CliContext;
use crate::apps::AppProfile;
use crate::config::Config;
use crate::metrics;
use crate::planner::{FilePlanner, HeuristicPlanner, Planner};
use crate::session::{ensure_logged_in, BrowserSession, Credentials, LoginPlan};

#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// App profile name (see `tracewalk apps`)
    #[arg(long)]
    pub app: String,

    /// Natural-language task
    #[arg(long)]
    pub task: String,

    /// Output root for screenshots and metadata
    #[arg(long, value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// Run the browser headless
    #[arg(long)]
    pub headless: bool,

    /// Persistent browser profile directory
    #[arg(long, value_name = "DIR")]
    pub profile: Option<PathBuf>,

    /// Execute at most this many steps
    #[arg(long, value_name = "N")]
    pub max_steps: Option<usize>,

    /// Open the login page and wait for a human to sign in
    #[arg(long)]
    pub manual_login: bool,

    /// Read the plan from a JSON file instead of the heuristic planner
    #[arg(long, value_name = "FILE")]
    pub plan: Option<PathBuf>,

    /// Attach to a running browser's DevTools websocket
    #[arg(long, value_name = "URL")]
    pub ws_url: Option<String>,

    /// Write browser-adapter metrics in Prometheus text format after the run
    #[arg(long, value_name = "FILE")]
    pub metrics_out: Option<PathBuf>,
}

impl RunArgs {
    /// Flags override configuration.
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(out) = &self.out {
            config.output_root = out.clone();
        }
        if self.headless {
            config.browser.headless = true;
        }
        if let Some(profile) = &self.profile {
            config.browser.profile_dir = profile.clone();
        }
        if let Some(max_steps) = self.max_steps {
            config.max_steps = max_steps;
        }
        if let Some(url) = &self.ws_url {
            config.browser.websocket_url = Some(url.clone());
        }
        config
    }

    pub fn planner(&self) -> Box<dyn Planner> {
        match &self.plan {
            Some(path) => Box::new(FilePlanner::new(path)),
            None => Box::new(HeuristicPlanner),
        }
    }
}

/// What a finished run left behind.
#[derive(Debug)]
pub struct RunOutcome {
    pub trace: RunTrace,
    pub summary: RunSummary,
    pub metadata: PathBuf,
}

/// Logs in, walks the plan and persists the trace on an already open page.
pub async fn execute_run(
    cdp: Arc<dyn Cdp>,
    page: PageId,
    config: &Config,
    app: &AppProfile,
    task: &str,
    plan: &Plan,
    login: &LoginPlan,
) -> Result<RunOutcome> {
    ensure_logged_in(cdp.as_ref(), page, app, login).await;

    let executor = ActionExecutor::new(Arc::clone(&cdp), page, config.executor.clone());
    let detector = StateDetector::new(Arc::clone(&cdp), page, config.detector.clone());
    let guard = CaptureGuard::with_config(
        Arc::clone(&cdp),
        page,
        &config.output_root,
        config.capture.clone(),
    );
    let mut runner = StepRunner::new(
        Arc::new(executor),
        Box::new(detector),
        guard,
        RunnerConfig {
            max_steps: config.max_steps,
        },
    );

    let (trace, summary) = runner.run(&app.name, task, plan).await;
    let writer = JsonTraceWriter::new(&config.output_root);
    let metadata = complete_run(&writer, &trace, &summary).context("Failed to save run metadata")?;
    Ok(RunOutcome {
        trace,
        summary,
        metadata,
    })
}

pub async fn cmd_run(args: RunArgs, ctx: &CliContext) -> Result<()> {
    let config = args.apply(ctx.config().clone());
    let app = ctx.app(&args.app)?.clone();
    let plan = args.planner().plan(&app, &args.task)?;
    info!(
        app = %app.name,
        task = %args.task,
        steps = plan.len(),
        max_steps = config.max_steps,
        output = %config.output_root.display(),
        "Plan ready"
    );

    let login = LoginPlan {
        manual: args.manual_login,
        credentials: Credentials::from_process_env(&app),
        waits: config.login.clone(),
        navigation_timeout: Duration::from_millis(config.browser.navigation_timeout_ms),
    };

    let session = BrowserSession::start(&config.browser).await?;
    let outcome = execute_run(
        session.cdp(),
        session.page(),
        &config,
        &app,
        &args.task,
        &plan,
        &login,
    )
    .await;
    session.close().await;
    let outcome = outcome?;

    log_metrics();
    if let Some(path) = &args.metrics_out {
        metrics::write_textfile(path)?;
        info!(path = %path.display(), "Wrote prometheus metrics");
    }
    println!(
        "{} steps recorded, {} screenshots captured -> {}",
        outcome.summary.steps_recorded,
        outcome.summary.screenshots_captured,
        outcome.metadata.display()
    );
    Ok(())
}

fn log_metrics() {
    let adapter = cdp_adapter::metrics::snapshot();
    let detector = perceiver_structural::metrics::snapshot();
    let capture = tracewalk_snapshot_store::metrics::snapshot();
    info!(
        target: "metrics",
        cdp_commands = adapter.commands,
        cdp_failures = adapter.command_failures,
        cdp_events = adapter.events,
        detections = detector.detections,
        detect_avg_ms = detector.avg_ms,
        probe_failures = detector.probe_failures,
        screenshots = capture.captured,
        screenshots_skipped = capture.skipped_unchanged,
        screenshot_failures = capture.failed,
        "Run metrics"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    use crate::cli::commands::Commands;
    use crate::cli::env::CliArgs;

    fn parse(argv: &[&str]) -> RunArgs {
        match CliArgs::parse_from(argv).command {
            Commands::Run(args) => args,
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn flags_override_config() {
        let args = parse(&[
            "tracewalk", "run", "--app", "notion", "--task", "Create page", "--headless",
            "--max-steps", "4", "--out", "/tmp/ds", "--ws-url", "ws://localhost:9222/x",
        ]);
        let config = args.apply(Config::default());
        assert!(config.browser.headless);
        assert_eq!(config.max_steps, 4);
        assert_eq!(config.output_root, PathBuf::from("/tmp/ds"));
        assert_eq!(
            config.browser.websocket_url.as_deref(),
            Some("ws://localhost:9222/x")
        );
    }

    #[test]
    fn absent_flags_keep_config() {
        let args = parse(&["tracewalk", "run", "--app", "linear", "--task", "t"]);
        let mut base = Config::default();
        base.browser.headless = true;
        base.max_steps = 7;
        let config = args.apply(base);
        assert!(config.browser.headless);
        assert_eq!(config.max_steps, 7);
        assert!(args.plan.is_none());
        assert!(args.metrics_out.is_none());
    }

    #[test]
    fn metrics_export_path_is_optional() {
        let args = parse(&[
            "tracewalk", "run", "--app", "linear", "--task", "t", "--metrics-out", "out/run.prom",
        ]);
        assert_eq!(args.metrics_out, Some(PathBuf::from("out/run.prom")));
    }
}
