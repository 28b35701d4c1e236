//! Target resolution with a fixed strategy precedence

use std::sync::Arc;

use async_trait::async_trait;
use cdp_adapter::{Cdp, PageId};
use tracewalk_core_types::TargetSpec;
use tracing::debug;

use crate::{errors::LocatorError, strategies::*, types::*};

/// Resolves targets into element queries.
#[async_trait]
pub trait ElementResolver: Send + Sync {
    /// Builds the lazy query for `target`. Never touches the page.
    fn resolve(&self, target: &TargetSpec) -> Resolution;

    /// Resolves and counts current matches on `page`.
    async fn locate(
        &self,
        cdp: &dyn Cdp,
        page: PageId,
        target: &TargetSpec,
    ) -> Result<Located, LocatorError>;
}

/// Default resolver with one strategy per target tag.
pub struct SelectorResolver {
    strategies: Vec<Arc<dyn Strategy>>,
}

impl Default for SelectorResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectorResolver {
    pub fn new() -> Self {
        let strategies = LocatorStrategy::fallback_chain()
            .into_iter()
            .map(strategy_for)
            .collect();
        Self { strategies }
    }

    pub fn strategies(&self) -> impl Iterator<Item = LocatorStrategy> + '_ {
        self.strategies.iter().map(|s| s.strategy_type())
    }
}

fn strategy_for(kind: LocatorStrategy) -> Arc<dyn Strategy> {
    match kind {
        LocatorStrategy::Css => Arc::new(CssStrategy),
        LocatorStrategy::RolePattern => Arc::new(RolePatternStrategy),
        LocatorStrategy::RoleName => Arc::new(RoleNameStrategy),
        LocatorStrategy::Text => Arc::new(TextStrategy),
        LocatorStrategy::Placeholder => Arc::new(PlaceholderStrategy),
        LocatorStrategy::Label => Arc::new(LabelStrategy),
        LocatorStrategy::XPath => Arc::new(XPathStrategy),
        LocatorStrategy::Root => Arc::new(RootStrategy),
    }
}

#[async_trait]
impl ElementResolver for SelectorResolver {
    fn resolve(&self, target: &TargetSpec) -> Resolution {
        for strategy in &self.strategies {
            if let Some(query) = strategy.query(target) {
                debug!(
                    target: "action-locator",
                    strategy = strategy.name(),
                    query = %query,
                    "resolved target"
                );
                return Resolution::new(query, strategy.strategy_type());
            }
        }
        Resolution::new(RootStrategy::root_query(), LocatorStrategy::Root)
    }

    async fn locate(
        &self,
        cdp: &dyn Cdp,
        page: PageId,
        target: &TargetSpec,
    ) -> Result<Located, LocatorError> {
        let resolution = self.resolve(target);
        let matches = cdp.count(page, &resolution.query).await?;
        debug!(
            target: "action-locator",
            query = %resolution.query,
            matches,
            "located target"
        );
        Ok(Located { resolution, matches })
    }
}
