//! Parameter types for adapter operations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AdapterError, AdapterErrorKind};

/// A lazily evaluated element lookup.
///
/// `script` is a JavaScript expression producing an array of elements. The
/// adapter re-evaluates it on every touch, so the handle never goes stale.
/// `label` is a stable human-readable key (`css=.btn`, `text=Save`) used in
/// logs and by the in-memory test page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementQuery {
    pub script: String,
    pub label: String,
}

impl ElementQuery {
    pub fn new(script: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            label: label.into(),
        }
    }

    /// Plain `querySelectorAll`; an invalid selector yields no matches.
    pub fn css(selector: &str) -> Self {
        let literal = js_string(selector);
        Self::new(
            format!(
                "(() => {{ try {{ return Array.from(document.querySelectorAll({literal})); }} catch (_) {{ return []; }} }})()"
            ),
            format!("css={selector}"),
        )
    }

    /// Wraps a per-element function body so it runs on the first match.
    ///
    /// The body sees the element as `el`. When nothing matches the
    /// expression evaluates to `{ status: 'not-found' }`.
    pub fn on_first(&self, body: &str) -> String {
        format!(
            "(() => {{\n  const list = {script};\n  const el = list && list.length ? list[0] : null;\n  if (!el) {{ return {{ status: 'not-found' }}; }}\n  {body}\n}})()",
            script = self.script,
        )
    }

    pub fn count_expression(&self) -> String {
        format!(
            "(() => {{ const list = {script}; return list ? list.length : 0; }})()",
            script = self.script
        )
    }
}

impl fmt::Display for ElementQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Encodes a Rust string as a JavaScript string literal.
pub fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

/// Element lifecycle states a caller can wait for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementState {
    Attached,
    Detached,
    Visible,
    Hidden,
}

impl ElementState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementState::Attached => "attached",
            ElementState::Detached => "detached",
            ElementState::Visible => "visible",
            ElementState::Hidden => "hidden",
        }
    }
}

impl Default for ElementState {
    fn default() -> Self {
        ElementState::Visible
    }
}

impl FromStr for ElementState {
    type Err = AdapterError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "attached" => Ok(ElementState::Attached),
            "detached" => Ok(ElementState::Detached),
            "visible" => Ok(ElementState::Visible),
            "hidden" => Ok(ElementState::Hidden),
            other => Err(AdapterError::new(AdapterErrorKind::InvalidArgument)
                .with_hint(format!("unknown element state '{other}'"))),
        }
    }
}

/// Page-level readiness gates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaitGate {
    DomReady,
    NetworkQuiet { window_ms: u64, max_inflight: u32 },
}

impl WaitGate {
    /// Quiet network: nothing in flight for half a second.
    pub fn network_idle() -> Self {
        WaitGate::NetworkQuiet {
            window_ms: 500,
            max_inflight: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_query_escapes_selector() {
        let query = ElementQuery::css("a[title=\"x\"]");
        assert!(query.script.contains(r#""a[title=\"x\"]""#));
        assert_eq!(query.label, "css=a[title=\"x\"]");
    }

    #[test]
    fn element_state_parses_known_names() {
        assert_eq!("Hidden".parse::<ElementState>().unwrap(), ElementState::Hidden);
        let err = "gone".parse::<ElementState>().unwrap_err();
        assert_eq!(err.kind, AdapterErrorKind::InvalidArgument);
    }
}
