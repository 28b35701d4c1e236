//! Plan sources.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracewalk_core_types::{ActionKind, Plan, Step, TargetSpec};
use tracing::info;

use crate::apps::AppProfile;

/// Produces the step list for a task.
pub trait Planner: Send + Sync {
    fn plan(&self, app: &AppProfile, task: &str) -> Result<Plan>;
}

/// Keyword-driven exploration plan.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicPlanner;

fn settle(description: &str, wait_ms: u64) -> Step {
    Step::new(ActionKind::Scroll, description)
        .with_input("0")
        .with_wait_ms(wait_ms)
        .with_capture_hint(true)
}

fn click_text(description: &str, text: &str, wait_ms: u64) -> Step {
    Step::new(ActionKind::Click, description)
        .with_selector(TargetSpec::Text(text.into()))
        .with_wait_ms(wait_ms)
        .with_capture_hint(true)
}

impl HeuristicPlanner {
    pub fn build(&self, app: &AppProfile, task: &str) -> Plan {
        let mut steps = vec![
            Step::new(ActionKind::Goto, format!("Navigate to {} workspace", app.name))
                .with_selector(TargetSpec::Css(app.start_url().to_string()))
                .with_wait_ms(2_000)
                .with_capture_hint(true),
            settle("Wait for page to stabilize", 1_500),
        ];

        let task = task.to_lowercase();
        if task.contains("create") || task.contains("new") {
            if task.contains("database") {
                steps.push(click_text("Look for New page button", "New page", 1_200));
                steps.push(click_text("Click Table/Database option", "Table", 1_000));
            } else if task.contains("page") {
                steps.push(click_text("Click New page", "New page", 1_200));
            }
        }

        if task.contains("filter") {
            steps.push(
                Step::new(ActionKind::Click, "Look for filter button")
                    .with_selector(TargetSpec::RoleNamePattern {
                        role: "button".into(),
                        pattern: "filter|Filter".into(),
                    })
                    .with_wait_ms(1_000)
                    .with_capture_hint(true),
            );
            steps.push(settle("Wait for filter UI", 800));
        }

        steps.push(settle("Final state capture", 500));
        Plan::new(steps)
    }
}

impl Planner for HeuristicPlanner {
    fn plan(&self, app: &AppProfile, task: &str) -> Result<Plan> {
        info!(target: "planner", app = %app.name, "Using heuristic plan");
        Ok(self.build(app, task))
    }
}

/// Reads a JSON plan (`{"steps": [...]}`) from disk.
#[derive(Debug, Clone)]
pub struct FilePlanner {
    path: PathBuf,
}

impl FilePlanner {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Planner for FilePlanner {
    fn plan(&self, _app: &AppProfile, _task: &str) -> Result<Plan> {
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("reading plan {}", self.path.display()))?;
        let plan = Plan::from_json_str(&raw)
            .with_context(|| format!("parsing plan {}", self.path.display()))?;
        info!(
            target: "planner",
            path = %self.path.display(),
            steps = plan.len(),
            "Loaded plan file"
        );
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apps::AppRegistry;

    fn descriptions(plan: &Plan) -> Vec<String> {
        plan.steps.iter().map(Step::label).collect()
    }

    fn notion() -> AppProfile {
        AppRegistry::builtin().get("notion").unwrap().clone()
    }

    #[test]
    fn baseline_plan_navigates_settles_and_captures() {
        let plan = HeuristicPlanner.build(&notion(), "Browse around");
        assert_eq!(
            descriptions(&plan),
            vec![
                "Navigate to notion workspace",
                "Wait for page to stabilize",
                "Final state capture"
            ]
        );
        let goto = &plan.steps[0];
        assert_eq!(goto.action, ActionKind::Goto);
        assert_eq!(goto.selector.navigation_url(), Some("https://www.notion.so"));
        assert_eq!(goto.wait_ms(), 2_000);
        assert!(plan.steps.iter().all(|s| s.capture_hint));
    }

    #[test]
    fn database_tasks_open_the_table_option() {
        let plan = HeuristicPlanner.build(&notion(), "Create a new database");
        let labels = descriptions(&plan);
        assert_eq!(labels[2], "Look for New page button");
        assert_eq!(labels[3], "Click Table/Database option");
        assert_eq!(plan.steps[3].selector, TargetSpec::Text("Table".into()));
        assert_eq!(plan.len(), 5);
    }

    #[test]
    fn page_tasks_click_new_page() {
        let plan = HeuristicPlanner.build(&notion(), "create page for notes");
        assert_eq!(descriptions(&plan)[2], "Click New page");
        assert_eq!(plan.len(), 4);
    }

    #[test]
    fn filter_tasks_add_filter_steps() {
        let linear = AppRegistry::builtin().get("linear").unwrap().clone();
        let plan = HeuristicPlanner.build(&linear, "Filter issues by status");
        assert_eq!(plan.len(), 5);
        assert_eq!(
            plan.steps[2].selector,
            TargetSpec::RoleNamePattern {
                role: "button".into(),
                pattern: "filter|Filter".into()
            }
        );
        assert_eq!(plan.steps[3].wait_ms(), 800);
    }

    #[test]
    fn file_planner_reads_steps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");
        fs::write(
            &path,
            r#"{"steps": [{"description": "Open", "action": "goto", "selector": {"css": "https://linear.app"}}, 7]}"#,
        )
        .unwrap();
        let plan = FilePlanner::new(&path).plan(&notion(), "ignored").unwrap();
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn file_planner_without_steps_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");
        fs::write(&path, r#"{"plan": []}"#).unwrap();
        assert!(FilePlanner::new(&path).plan(&notion(), "t").unwrap().is_empty());
    }

    #[test]
    fn unreadable_plan_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = FilePlanner::new(dir.path().join("missing.json"));
        assert!(missing.plan(&notion(), "t").is_err());

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{not json").unwrap();
        assert!(FilePlanner::new(&broken).plan(&notion(), "t").is_err());
    }
}
