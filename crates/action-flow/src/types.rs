//! Core types for the step runner

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Runner knobs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Steps executed at most; the rest of the plan is ignored
    pub max_steps: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self { max_steps: 20 }
    }
}

/// Totals for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Records appended to the trace
    pub steps_recorded: usize,

    /// Records carrying a screenshot
    pub screenshots_captured: usize,

    /// Steps whose action reported a failure
    pub actions_failed: usize,

    /// Steps that could not be observed
    pub degraded_steps: usize,

    /// Start time
    pub started_at: DateTime<Utc>,

    /// Finish time
    pub finished_at: DateTime<Utc>,

    /// Total latency in milliseconds
    pub latency_ms: u64,
}
