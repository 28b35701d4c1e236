//! Settle, probe and fingerprint the page after a step.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use cdp_adapter::{AdapterError, Cdp, ElementQuery, PageId, WaitGate};
use chrono::Utc;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

use crate::api::PageObserver;
use crate::errors::DetectError;
use crate::metrics;
use crate::model::PageState;
use crate::policy::DetectorConfig;
use crate::signature::content_signature;

/// Dialog-like surfaces.
pub const MODAL_SELECTOR: &str =
    r#"[role="dialog"], .modal, [class*="Dialog"], [data-modal="true"]"#;

/// Popovers, menus and dimming layers.
pub const OVERLAY_SELECTOR: &str = r#"[class*="overlay"], [class*="Popover"], [class*="dropdown"]"#;

/// Detector bound to one page, holding the previous url and signature.
pub struct StateDetector {
    cdp: Arc<dyn Cdp>,
    page: PageId,
    config: DetectorConfig,
    modal: ElementQuery,
    overlay: ElementQuery,
    last_url: Option<String>,
    last_signature: Option<String>,
}

impl StateDetector {
    pub fn new(cdp: Arc<dyn Cdp>, page: PageId, config: DetectorConfig) -> Self {
        Self {
            cdp,
            page,
            config,
            modal: ElementQuery::css(MODAL_SELECTOR),
            overlay: ElementQuery::css(OVERLAY_SELECTOR),
            last_url: None,
            last_signature: None,
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn last_signature(&self) -> Option<&str> {
        self.last_signature.as_deref()
    }

    async fn stabilize(&self) {
        let budget = self.config.network_idle_timeout();
        let quiet = self
            .cdp
            .wait_basic(self.page, WaitGate::network_idle(), budget);
        match timeout(budget, quiet).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                debug!(target: "perceiver.detector", error = %err, "network never went quiet");
            }
            Err(_) => {
                debug!(
                    target: "perceiver.detector",
                    budget_ms = budget.as_millis() as u64,
                    "network-quiet wait abandoned"
                );
            }
        }
        sleep(self.config.settle()).await;
        sleep(self.config.capture_delay()).await;
    }

    async fn probe<T, F>(&self, what: &'static str, op: F) -> Option<T>
    where
        F: Future<Output = Result<T, AdapterError>>,
    {
        let budget = self.config.probe();
        match timeout(budget, op).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(err)) => {
                metrics::record_probe_failure();
                debug!(target: "perceiver.detector", probe = what, error = %err, "probe failed");
                None
            }
            Err(_) => {
                metrics::record_probe_failure();
                debug!(
                    target: "perceiver.detector",
                    probe = what,
                    budget_ms = budget.as_millis() as u64,
                    "probe timed out"
                );
                None
            }
        }
    }

    /// Settles the page, then probes it.
    ///
    /// Probes are independent; a failed one falls back to the previous
    /// value (url, signature) or `false` (modal, overlay). Only when all of
    /// them fail is the page reported unavailable.
    pub async fn detect(&mut self) -> Result<PageState, DetectError> {
        let start = Instant::now();
        self.stabilize().await;

        let cdp = Arc::clone(&self.cdp);
        let page = self.page;
        let url = self.probe("url", cdp.current_url(page)).await;
        let modal = self.probe("modal", cdp.count(page, &self.modal)).await;
        let overlay = self.probe("overlay", cdp.count(page, &self.overlay)).await;
        let markup = self.probe("content", cdp.content(page)).await;

        if url.is_none() && modal.is_none() && overlay.is_none() && markup.is_none() {
            metrics::record_unavailable();
            warn!(target: "perceiver.detector", "every page probe failed");
            return Err(DetectError::PageUnavailable(
                "url, modal, overlay and content probes all failed".into(),
            ));
        }

        let url = url
            .or_else(|| self.last_url.clone())
            .unwrap_or_default();
        let has_modal = modal.map_or(false, |n| n > 0);
        let has_overlay = overlay.map_or(false, |n| n > 0);
        let signature = markup
            .as_deref()
            .map(content_signature)
            .or_else(|| self.last_signature.clone());

        let changed = self.last_signature.is_none() || signature != self.last_signature;
        let significant = changed || has_modal || has_overlay;

        self.last_url = Some(url.clone());
        self.last_signature = signature.clone();

        let state = PageState {
            url,
            has_modal,
            has_overlay,
            content_signature: signature,
            changed,
            significant,
            timestamp: Utc::now(),
        };
        metrics::record_detect(significant, start.elapsed());
        info!(
            target: "perceiver.detector",
            url = %state.url,
            surfaces = state.surfaces(),
            changed,
            significant,
            "page state"
        );
        Ok(state)
    }
}

#[async_trait]
impl PageObserver for StateDetector {
    async fn detect(&mut self) -> Result<PageState, DetectError> {
        StateDetector::detect(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdp_adapter::fake::{FakeCall, FakePage};
    use cdp_adapter::AdapterErrorKind;
    use std::time::Duration;

    fn detector() -> (StateDetector, Arc<FakePage>) {
        let fake = Arc::new(FakePage::new());
        let detector = StateDetector::new(fake.clone(), PageId::new(), DetectorConfig::default());
        (detector, fake)
    }

    fn io_error() -> AdapterError {
        AdapterError::new(AdapterErrorKind::CdpIo)
    }

    #[tokio::test(start_paused = true)]
    async fn first_detection_is_significant() {
        let (mut detector, fake) = detector();
        fake.set_url("https://linear.app/team");

        let state = detector.detect().await.unwrap();
        assert!(state.changed);
        assert!(state.significant);
        assert_eq!(state.url, "https://linear.app/team");
        assert!(!state.has_modal && !state.has_overlay);
    }

    #[tokio::test(start_paused = true)]
    async fn unchanged_markup_is_not_significant() {
        let (mut detector, fake) = detector();
        fake.set_content("<html><body>board</body></html>");
        let first = detector.detect().await.unwrap();
        let second = detector.detect().await.unwrap();

        assert_eq!(first.content_signature, second.content_signature);
        assert!(!second.changed);
        assert!(!second.significant);

        fake.set_content("<html><body>board + card</body></html>");
        let third = detector.detect().await.unwrap();
        assert!(third.changed && third.significant);
    }

    #[tokio::test(start_paused = true)]
    async fn open_modal_is_significant_without_markup_change() {
        let (mut detector, fake) = detector();
        detector.detect().await.unwrap();

        fake.add_element(format!("css={MODAL_SELECTOR}"), 1);
        let state = detector.detect().await.unwrap();
        assert!(state.has_modal);
        assert!(!state.changed);
        assert!(state.significant);
        assert_eq!(state.surfaces(), "modal");
    }

    #[tokio::test(start_paused = true)]
    async fn overlay_is_detected() {
        let (mut detector, fake) = detector();
        fake.add_element(format!("css={OVERLAY_SELECTOR}"), 3);
        let state = detector.detect().await.unwrap();
        assert!(state.has_overlay);
        assert!(!state.has_modal);
    }

    #[tokio::test(start_paused = true)]
    async fn settles_before_probing() {
        let (mut detector, fake) = detector();
        let started = Instant::now();
        detector.detect().await.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(2_000));
        assert_eq!(fake.calls(), vec![FakeCall::WaitBasic(WaitGate::network_idle())]);
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_network_wait_is_abandoned() {
        let (mut detector, fake) = detector();
        fake.stall("wait_basic");
        let started = Instant::now();
        let state = detector.detect().await.unwrap();

        assert!(state.significant);
        assert!(started.elapsed() >= Duration::from_millis(22_000));
        assert!(started.elapsed() < Duration::from_millis(23_000));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_probes_fall_back_to_memory() {
        let (mut detector, fake) = detector();
        fake.set_url("https://trello.com/b/1");
        let first = detector.detect().await.unwrap();

        fake.fail("current_url", io_error());
        fake.fail("content", io_error());
        fake.set_content("<html>different</html>");
        let second = detector.detect().await.unwrap();

        assert_eq!(second.url, "https://trello.com/b/1");
        assert_eq!(second.content_signature, first.content_signature);
        assert!(!second.changed);
    }

    #[tokio::test(start_paused = true)]
    async fn url_probe_failure_without_memory_is_empty() {
        let (mut detector, fake) = detector();
        fake.fail("current_url", io_error());
        let state = detector.detect().await.unwrap();
        assert_eq!(state.url, "");
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_probe_counts_as_failure() {
        let (mut detector, fake) = detector();
        fake.stall("content");
        let state = detector.detect().await.unwrap();
        assert_eq!(state.content_signature, None);
        assert!(state.changed);
    }

    #[tokio::test(start_paused = true)]
    async fn all_probes_failing_means_page_unavailable() {
        let (mut detector, fake) = detector();
        for op in ["current_url", "count", "content"] {
            fake.fail(op, io_error());
        }
        let err = detector.detect().await.unwrap_err();
        assert!(matches!(err, DetectError::PageUnavailable(_)));

        for op in ["current_url", "count", "content"] {
            fake.heal(op);
        }
        assert!(detector.detect().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn observer_trait_delegates() {
        let (detector, _fake) = detector();
        let mut observer: Box<dyn PageObserver> = Box::new(detector);
        assert!(observer.detect().await.unwrap().significant);
    }
}
