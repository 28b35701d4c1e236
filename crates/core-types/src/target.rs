//! Element target descriptions.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tracing::warn;

use crate::lenient;

/// Which element an action affects.
///
/// Planners emit loose maps such as `{"role": "button", "name": "Save"}`.
/// Those are folded into exactly one variant, picking the first clause that
/// applies in this order:
///
/// 1. `css`
/// 2. `role` + `name_regex`
/// 3. `role` + `name`
/// 4. `text`
/// 5. `placeholder`
/// 6. `label`
/// 7. `xpath`
/// 8. document root
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TargetSpec {
    /// CSS selector. Values starting with `http` double as navigation URLs.
    Css(String),

    /// ARIA role whose accessible name matches a case-insensitive pattern.
    RoleNamePattern { role: String, pattern: String },

    /// ARIA role with an exact accessible name.
    RoleName { role: String, name: String },

    /// Visible text content.
    Text(String),

    /// Input placeholder text.
    Placeholder(String),

    /// Associated label text.
    Label(String),

    /// XPath expression.
    XPath(String),

    /// Whole document; keyboard input lands on whatever has focus.
    #[default]
    Root,
}

impl TargetSpec {
    /// True when the target carries no clause at all.
    pub fn is_root(&self) -> bool {
        matches!(self, TargetSpec::Root)
    }

    /// URL used by `goto` steps, which smuggle it through the `css` slot.
    pub fn navigation_url(&self) -> Option<&str> {
        match self {
            TargetSpec::Css(value) if value.starts_with("http") => Some(value.as_str()),
            _ => None,
        }
    }

    /// Short human-readable form for logs.
    pub fn describe(&self) -> String {
        match self {
            TargetSpec::Css(s) => format!("css:{s}"),
            TargetSpec::RoleNamePattern { role, pattern } => format!("role:{role}[name~/{pattern}/i]"),
            TargetSpec::RoleName { role, name } => format!("role:{role}[name='{name}']"),
            TargetSpec::Text(t) => format!("text:'{t}'"),
            TargetSpec::Placeholder(p) => format!("placeholder:'{p}'"),
            TargetSpec::Label(l) => format!("label:'{l}'"),
            TargetSpec::XPath(x) => format!("xpath:{x}"),
            TargetSpec::Root => "root".to_string(),
        }
    }
}

/// Wire shape of a target as planners write it.
#[derive(Debug, Default, Deserialize, Serialize)]
struct RawTarget {
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    css: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    name_regex: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    placeholder: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    xpath: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl From<RawTarget> for TargetSpec {
    fn from(raw: RawTarget) -> Self {
        if let Some(css) = non_empty(raw.css) {
            return TargetSpec::Css(css);
        }
        if let Some(role) = raw.role {
            if let Some(pattern) = non_empty(raw.name_regex) {
                return TargetSpec::RoleNamePattern { role, pattern };
            }
            if let Some(name) = raw.name {
                return TargetSpec::RoleName { role, name };
            }
        }
        if let Some(text) = non_empty(raw.text) {
            return TargetSpec::Text(text);
        }
        if let Some(placeholder) = non_empty(raw.placeholder) {
            return TargetSpec::Placeholder(placeholder);
        }
        if let Some(label) = non_empty(raw.label) {
            return TargetSpec::Label(label);
        }
        if let Some(xpath) = non_empty(raw.xpath) {
            return TargetSpec::XPath(xpath);
        }
        TargetSpec::Root
    }
}

impl From<&TargetSpec> for RawTarget {
    fn from(spec: &TargetSpec) -> Self {
        let mut raw = RawTarget::default();
        match spec {
            TargetSpec::Css(s) => raw.css = Some(s.clone()),
            TargetSpec::RoleNamePattern { role, pattern } => {
                raw.role = Some(role.clone());
                raw.name_regex = Some(pattern.clone());
            }
            TargetSpec::RoleName { role, name } => {
                raw.role = Some(role.clone());
                raw.name = Some(name.clone());
            }
            TargetSpec::Text(t) => raw.text = Some(t.clone()),
            TargetSpec::Placeholder(p) => raw.placeholder = Some(p.clone()),
            TargetSpec::Label(l) => raw.label = Some(l.clone()),
            TargetSpec::XPath(x) => raw.xpath = Some(x.clone()),
            TargetSpec::Root => {}
        }
        raw
    }
}

impl<'de> Deserialize<'de> for TargetSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Anything but an object (a bare "#save", a list) targets the root.
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(TargetSpec::Root),
            Some(value @ Value::Object(_)) => match serde_json::from_value::<RawTarget>(value) {
                Ok(raw) => Ok(TargetSpec::from(raw)),
                Err(err) => {
                    warn!(target: "plan", %err, "unreadable selector; using document root");
                    Ok(TargetSpec::Root)
                }
            },
            Some(other) => {
                warn!(target: "plan", selector = %other, "selector is not an object; using document root");
                Ok(TargetSpec::Root)
            }
        }
    }
}

impl Serialize for TargetSpec {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        RawTarget::from(self).serialize(serializer)
    }
}
