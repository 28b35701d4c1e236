//! Planned steps and plans.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tracing::warn;

use crate::errors::PlanError;
use crate::lenient;
use crate::target::TargetSpec;

/// Settle delay applied after an action when the step does not set one.
pub const DEFAULT_WAIT_MS: u64 = 300;

/// Action verb of a step.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Goto,
    Click,
    Hover,
    Type,
    Press,
    WaitFor,
    Scroll,
    /// Anything a planner emitted that the executor does not know; kept verbatim.
    Unknown(String),
}

impl ActionKind {
    pub fn as_str(&self) -> &str {
        match self {
            ActionKind::Goto => "goto",
            ActionKind::Click => "click",
            ActionKind::Hover => "hover",
            ActionKind::Type => "type",
            ActionKind::Press => "press",
            ActionKind::WaitFor => "wait_for",
            ActionKind::Scroll => "scroll",
            ActionKind::Unknown(raw) => raw.as_str(),
        }
    }
}

impl Default for ActionKind {
    fn default() -> Self {
        ActionKind::Unknown(String::new())
    }
}

impl From<&str> for ActionKind {
    fn from(raw: &str) -> Self {
        match raw {
            "goto" => ActionKind::Goto,
            "click" => ActionKind::Click,
            "hover" => ActionKind::Hover,
            "type" => ActionKind::Type,
            "press" => ActionKind::Press,
            "wait_for" => ActionKind::WaitFor,
            "scroll" => ActionKind::Scroll,
            other => ActionKind::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Unknown(raw) if raw.is_empty() => f.write_str("<none>"),
            other => f.write_str(other.as_str()),
        }
    }
}

impl Serialize for ActionKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            ActionKind::Unknown(raw) if raw.is_empty() => serializer.serialize_none(),
            other => serializer.serialize_str(other.as_str()),
        }
    }
}

impl<'de> Deserialize<'de> for ActionKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = lenient::opt_string(deserializer)?;
        Ok(raw.as_deref().map(ActionKind::from).unwrap_or_default())
    }
}

/// One planned unit of interaction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Step {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub action: ActionKind,

    #[serde(default)]
    pub selector: TargetSpec,

    #[serde(default, deserialize_with = "lenient::opt_string")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,

    #[serde(default, deserialize_with = "lenient::opt_millis")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_ms: Option<u64>,

    #[serde(default, deserialize_with = "lenient::flag")]
    pub capture_hint: bool,
}

impl Step {
    pub fn new(action: ActionKind, description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            action,
            ..Self::default()
        }
    }

    pub fn with_selector(mut self, selector: TargetSpec) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = Some(input.into());
        self
    }

    pub fn with_wait_ms(mut self, wait_ms: u64) -> Self {
        self.wait_ms = Some(wait_ms);
        self
    }

    pub fn with_capture_hint(mut self, hint: bool) -> Self {
        self.capture_hint = hint;
        self
    }

    /// Settle delay after the action.
    pub fn wait_ms(&self) -> u64 {
        self.wait_ms.unwrap_or(DEFAULT_WAIT_MS)
    }

    /// Description for logs and file names, falling back to the action verb.
    pub fn label(&self) -> String {
        match self.description.as_deref() {
            Some(desc) if !desc.is_empty() => desc.to_string(),
            _ => self.action.to_string(),
        }
    }
}

/// Ordered list of steps produced by a planner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub steps: Vec<Step>,
}

impl Plan {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Builds a plan from arbitrary planner output.
    ///
    /// A missing or non-array `steps` key yields an empty plan. Entries that
    /// are not objects, or that cannot be read as a step, are dropped.
    pub fn from_value(value: &Value) -> Self {
        let Some(entries) = value.get("steps").and_then(Value::as_array) else {
            warn!(target: "plan", "plan has no steps array; treating it as empty");
            return Self::default();
        };

        let mut steps = Vec::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            if !entry.is_object() {
                warn!(target: "plan", position, "skipping non-object plan entry");
                continue;
            }
            match serde_json::from_value::<Step>(entry.clone()) {
                Ok(step) => steps.push(step),
                Err(err) => {
                    warn!(target: "plan", position, %err, "skipping unreadable plan entry");
                }
            }
        }
        Self { steps }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, PlanError> {
        let value: Value = serde_json::from_str(raw)?;
        Ok(Self::from_value(&value))
    }
}
