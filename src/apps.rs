//! Known target applications.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where an application lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppProfile {
    pub name: String,
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_url: Option<String>,
    /// Landing page after login; defaults to `base_url`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_url: Option<String>,
}

impl AppProfile {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            login_url: None,
            workspace_url: None,
        }
    }

    pub fn with_login(mut self, login_url: impl Into<String>) -> Self {
        self.login_url = Some(login_url.into());
        self
    }

    pub fn start_url(&self) -> &str {
        self.workspace_url.as_deref().unwrap_or(&self.base_url)
    }

    /// Prefix for per-app credential variables, e.g. `NOTION`.
    pub fn env_prefix(&self) -> String {
        self.name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AppError {
    #[error("unknown app '{name}' (known: {known})")]
    Unknown { name: String, known: String },
}

/// Built-in profiles plus any configured extras, keyed by lowercase name.
#[derive(Debug, Clone)]
pub struct AppRegistry {
    profiles: BTreeMap<String, AppProfile>,
}

impl Default for AppRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl AppRegistry {
    pub fn builtin() -> Self {
        let mut registry = Self {
            profiles: BTreeMap::new(),
        };
        for profile in [
            AppProfile::new("trello", "https://trello.com").with_login("https://trello.com/login"),
            AppProfile::new("notion", "https://www.notion.so")
                .with_login("https://www.notion.so/login"),
            AppProfile::new("linear", "https://linear.app").with_login("https://linear.app/login"),
        ] {
            registry.insert(profile);
        }
        registry
    }

    /// Builtins overlaid with `extra`; an extra with a builtin's name replaces it.
    pub fn with_extra(extra: &[AppProfile]) -> Self {
        let mut registry = Self::builtin();
        for profile in extra {
            registry.insert(profile.clone());
        }
        registry
    }

    pub fn insert(&mut self, profile: AppProfile) {
        self.profiles.insert(profile.name.to_ascii_lowercase(), profile);
    }

    pub fn get(&self, name: &str) -> Result<&AppProfile, AppError> {
        self.profiles
            .get(&name.trim().to_ascii_lowercase())
            .ok_or_else(|| AppError::Unknown {
                name: name.to_string(),
                known: self.names().join(", "),
            })
    }

    pub fn names(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AppProfile> {
        self.profiles.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_known() {
        let registry = AppRegistry::builtin();
        assert_eq!(registry.names(), vec!["linear", "notion", "trello"]);
        let notion = registry.get("Notion").unwrap();
        assert_eq!(notion.start_url(), "https://www.notion.so");
        assert_eq!(notion.login_url.as_deref(), Some("https://www.notion.so/login"));
    }

    #[test]
    fn unknown_app_lists_alternatives() {
        let err = AppRegistry::builtin().get("jira").unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown app 'jira' (known: linear, notion, trello)"
        );
    }

    #[test]
    fn extras_extend_and_override() {
        let mut custom = AppProfile::new("linear", "https://linear.app");
        custom.workspace_url = Some("https://linear.app/acme".into());
        let registry = AppRegistry::with_extra(&[
            custom,
            AppProfile::new("Asana", "https://app.asana.com"),
        ]);

        assert_eq!(registry.get("linear").unwrap().start_url(), "https://linear.app/acme");
        assert!(registry.get("linear").unwrap().login_url.is_none());
        assert!(registry.get("asana").is_ok());
    }

    #[test]
    fn env_prefix_is_shouted() {
        assert_eq!(AppProfile::new("my-app", "https://x").env_prefix(), "MY_APP");
    }
}
