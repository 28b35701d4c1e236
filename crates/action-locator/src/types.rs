//! Core types for the locator

use std::fmt;

use cdp_adapter::ElementQuery;
use serde::{Deserialize, Serialize};
use tracewalk_core_types::TargetSpec;

/// One strategy per target tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocatorStrategy {
    Css,
    /// ARIA role plus a case-insensitive name pattern.
    RolePattern,
    /// ARIA role plus an exact accessible name.
    RoleName,
    Text,
    Placeholder,
    Label,
    #[serde(rename = "xpath")]
    XPath,
    /// Document body; keystrokes go to whatever has focus.
    Root,
}

impl LocatorStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            LocatorStrategy::Css => "css",
            LocatorStrategy::RolePattern => "role-pattern",
            LocatorStrategy::RoleName => "role-name",
            LocatorStrategy::Text => "text",
            LocatorStrategy::Placeholder => "placeholder",
            LocatorStrategy::Label => "label",
            LocatorStrategy::XPath => "xpath",
            LocatorStrategy::Root => "root",
        }
    }

    /// All strategies in precedence order.
    pub fn fallback_chain() -> Vec<LocatorStrategy> {
        vec![
            LocatorStrategy::Css,
            LocatorStrategy::RolePattern,
            LocatorStrategy::RoleName,
            LocatorStrategy::Text,
            LocatorStrategy::Placeholder,
            LocatorStrategy::Label,
            LocatorStrategy::XPath,
            LocatorStrategy::Root,
        ]
    }

    /// Strategy that owns this target's tag.
    pub fn for_target(target: &TargetSpec) -> LocatorStrategy {
        match target {
            TargetSpec::Css(_) => LocatorStrategy::Css,
            TargetSpec::RoleNamePattern { .. } => LocatorStrategy::RolePattern,
            TargetSpec::RoleName { .. } => LocatorStrategy::RoleName,
            TargetSpec::Text(_) => LocatorStrategy::Text,
            TargetSpec::Placeholder(_) => LocatorStrategy::Placeholder,
            TargetSpec::Label(_) => LocatorStrategy::Label,
            TargetSpec::XPath(_) => LocatorStrategy::XPath,
            TargetSpec::Root => LocatorStrategy::Root,
        }
    }
}

impl fmt::Display for LocatorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A resolved target: the lazy query plus the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub query: ElementQuery,
    pub strategy: LocatorStrategy,
}

impl Resolution {
    pub fn new(query: ElementQuery, strategy: LocatorStrategy) -> Self {
        Self { query, strategy }
    }

    pub fn is_root(&self) -> bool {
        self.strategy == LocatorStrategy::Root
    }
}

/// Outcome of checking a resolution against the live page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    pub resolution: Resolution,
    pub matches: usize,
}

impl Located {
    pub fn is_present(&self) -> bool {
        self.matches > 0
    }

    pub fn query(&self) -> &ElementQuery {
        &self.resolution.query
    }
}
