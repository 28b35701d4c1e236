//! Execution trace entries.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::step::{ActionKind, Step};
use crate::target::TargetSpec;

/// Coarse result of executing a step's action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    Ok,
    Skipped,
    Failed,
}

/// One entry of the persisted execution trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// 1-based position in the plan.
    pub index: usize,

    pub description: Option<String>,

    pub action: ActionKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<TargetSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_modal: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_overlay: Option<bool>,

    /// Screenshot written for this step, if any.
    pub screenshot: Option<PathBuf>,

    pub timestamp: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<ActionStatus>,

    /// Set only for steps whose state could not be observed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepRecord {
    /// Record for a step that ran and was observed.
    pub fn observed(index: usize, step: &Step, timestamp: DateTime<Utc>) -> Self {
        Self {
            index,
            description: step.description.clone(),
            action: step.action.clone(),
            selector: Some(step.selector.clone()),
            input: step.input.clone(),
            url: None,
            has_modal: None,
            has_overlay: None,
            screenshot: None,
            timestamp,
            outcome: None,
            error: None,
        }
    }

    /// Record for a step whose observation failed.
    pub fn degraded(index: usize, step: &Step, error: impl Into<String>) -> Self {
        Self {
            index,
            description: step.description.clone(),
            action: step.action.clone(),
            selector: None,
            input: None,
            url: None,
            has_modal: None,
            has_overlay: None,
            screenshot: None,
            timestamp: Utc::now(),
            outcome: None,
            error: Some(error.into()),
        }
    }

    pub fn has_screenshot(&self) -> bool {
        self.screenshot.is_some()
    }
}

/// The persisted result of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunTrace {
    pub app: String,
    pub task: String,
    pub steps: Vec<StepRecord>,
}

impl RunTrace {
    pub fn new(app: impl Into<String>, task: impl Into<String>) -> Self {
        Self {
            app: app.into(),
            task: task.into(),
            steps: Vec::new(),
        }
    }

    pub fn push(&mut self, record: StepRecord) {
        self.steps.push(record);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn screenshots(&self) -> usize {
        self.steps.iter().filter(|r| r.has_screenshot()).count()
    }
}
