//! Core data types for action primitives

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracewalk_core_types::{ActionKind, ActionStatus};

use crate::errors::ActionError;

/// Per-operation budgets, all in milliseconds except the scroll distance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    pub navigation_ms: u64,
    pub scroll_into_view_ms: u64,
    pub click_ms: u64,
    /// Network quiescence after a click.
    pub click_idle_ms: u64,
    pub hover_ms: u64,
    pub fill_ms: u64,
    pub keystroke_delay_ms: u64,
    pub wait_for_ms: u64,
    pub default_scroll_px: i64,
    /// URL and markup reads for the click fingerprint.
    pub probe_ms: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            navigation_ms: 30_000,
            scroll_into_view_ms: 3_000,
            click_ms: 6_000,
            click_idle_ms: 6_000,
            hover_ms: 5_000,
            fill_ms: 5_000,
            keystroke_delay_ms: 50,
            wait_for_ms: 10_000,
            default_scroll_px: 800,
            probe_ms: 2_000,
        }
    }
}

impl ExecutorConfig {
    pub fn navigation(&self) -> Duration {
        Duration::from_millis(self.navigation_ms)
    }

    pub fn scroll_into_view(&self) -> Duration {
        Duration::from_millis(self.scroll_into_view_ms)
    }

    pub fn click(&self) -> Duration {
        Duration::from_millis(self.click_ms)
    }

    pub fn click_idle(&self) -> Duration {
        Duration::from_millis(self.click_idle_ms)
    }

    pub fn hover(&self) -> Duration {
        Duration::from_millis(self.hover_ms)
    }

    pub fn fill(&self) -> Duration {
        Duration::from_millis(self.fill_ms)
    }

    pub fn keystroke_delay(&self) -> Duration {
        Duration::from_millis(self.keystroke_delay_ms)
    }

    pub fn wait_for(&self) -> Duration {
        Duration::from_millis(self.wait_for_ms)
    }

    pub fn probe(&self) -> Duration {
        Duration::from_millis(self.probe_ms)
    }

    /// Time allowed for typing `text` at the configured keystroke delay.
    pub fn typing(&self, text: &str) -> Duration {
        let chars = text.chars().count() as u32;
        self.fill() + self.keystroke_delay() * chars
    }
}

/// How one action ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    Done,
    /// Nothing to act on; the run moves on.
    Skipped { reason: String },
    Failed { error: ActionError },
}

impl ActionOutcome {
    pub fn status(&self) -> ActionStatus {
        match self {
            ActionOutcome::Done => ActionStatus::Ok,
            ActionOutcome::Skipped { .. } => ActionStatus::Skipped,
            ActionOutcome::Failed { .. } => ActionStatus::Failed,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ActionOutcome::Failed { .. })
    }
}

/// Action execution report
#[derive(Debug, Clone)]
pub struct ActionReport {
    pub action: ActionKind,
    pub outcome: ActionOutcome,
    /// Click dispatches performed; 0 for other actions.
    pub click_attempts: u32,
    pub started_at: DateTime<Utc>,
    pub latency_ms: u64,
}

/// What a primitive hands back to the executor on success.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Completed {
    pub skipped: Option<String>,
    pub click_attempts: u32,
}

impl Completed {
    pub fn done() -> Self {
        Self {
            skipped: None,
            click_attempts: 0,
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            skipped: Some(reason.into()),
            click_attempts: 0,
        }
    }

    pub fn clicked(attempts: u32) -> Self {
        Self {
            skipped: None,
            click_attempts: attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budgets_default_to_interactive_timings() {
        let cfg = ExecutorConfig::default();
        assert_eq!(cfg.click(), Duration::from_secs(6));
        assert_eq!(cfg.default_scroll_px, 800);
        assert_eq!(cfg.typing("abc"), Duration::from_millis(5_150));
    }

    #[test]
    fn partial_config_keeps_remaining_defaults() {
        let cfg: ExecutorConfig = serde_json::from_str(r#"{"click_ms": 1000}"#).unwrap();
        assert_eq!(cfg.click_ms, 1000);
        assert_eq!(cfg.hover_ms, 5000);
    }

    #[test]
    fn outcome_maps_onto_record_status() {
        assert_eq!(ActionOutcome::Done.status(), ActionStatus::Ok);
        let failed = ActionOutcome::Failed {
            error: ActionError::InvalidInput("x".into()),
        };
        assert_eq!(failed.status(), ActionStatus::Failed);
        assert!(failed.is_failed());
    }
}
