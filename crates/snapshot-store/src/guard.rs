//! Screenshot capture with duplicate-state suppression.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cdp_adapter::{AdapterError, Cdp, PageId};
use tokio::time::timeout;
use tracing::{debug, info};

use crate::errors::{SnapErrKind, SnapError};
use crate::fs::{layout, writer};
use crate::metrics;
use crate::model::{CaptureMemory, Fingerprint};
use crate::policy::CaptureConfig;

/// Takes at most one screenshot per distinct (url, markup length).
///
/// The counter numbers files within the run and is bumped for every
/// attempt, including ones whose screenshot then fails.
pub struct CaptureGuard {
    cdp: Arc<dyn Cdp>,
    page: PageId,
    out_root: PathBuf,
    config: CaptureConfig,
    memory: CaptureMemory,
    counter: u32,
}

impl CaptureGuard {
    pub fn new(cdp: Arc<dyn Cdp>, page: PageId, out_root: impl Into<PathBuf>) -> Self {
        Self::with_config(cdp, page, out_root, CaptureConfig::default())
    }

    pub fn with_config(
        cdp: Arc<dyn Cdp>,
        page: PageId,
        out_root: impl Into<PathBuf>,
        config: CaptureConfig,
    ) -> Self {
        Self {
            cdp,
            page,
            out_root: out_root.into(),
            config,
            memory: CaptureMemory::default(),
            counter: 0,
        }
    }

    pub fn out_root(&self) -> &Path {
        &self.out_root
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub fn memory(&self) -> &CaptureMemory {
        &self.memory
    }

    async fn read<T, F>(&self, what: &'static str, op: F) -> Option<T>
    where
        F: Future<Output = Result<T, AdapterError>>,
    {
        match timeout(self.config.probe(), op).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(err)) => {
                debug!(target: "snapshot-store", read = what, error = %err, "fingerprint read failed");
                None
            }
            Err(_) => {
                debug!(target: "snapshot-store", read = what, "fingerprint read timed out");
                None
            }
        }
    }

    pub async fn fingerprint(&self) -> Fingerprint {
        let url = self.read("url", self.cdp.current_url(self.page)).await;
        let content_length = self
            .read("content", self.cdp.content(self.page))
            .await
            .map(|markup| markup.len());
        Fingerprint {
            url,
            content_length,
        }
    }

    /// Screenshots the viewport unless the page looks the same as at the
    /// last capture. `Ok(None)` means the capture was suppressed.
    pub async fn capture(
        &mut self,
        app: &str,
        task: &str,
        description: &str,
    ) -> Result<Option<PathBuf>, SnapError> {
        let fingerprint = self.fingerprint().await;
        if self.memory.matches(&fingerprint) {
            metrics::record_skip();
            info!(
                target: "snapshot-store",
                description,
                "Skipping screenshot (no state change detected)"
            );
            return Ok(None);
        }

        self.counter += 1;
        let path = layout::screenshot_path(&self.out_root, app, task, self.counter, description);

        let bytes = match self.shoot().await {
            Ok(bytes) => bytes,
            Err(err) => {
                metrics::record_failure();
                return Err(err);
            }
        };
        if let Err(err) = writer::write_atomic(&path, &bytes) {
            metrics::record_failure();
            return Err(err.into());
        }

        metrics::record_capture(bytes.len());
        self.memory.remember(fingerprint);
        info!(
            target: "snapshot-store",
            path = %path.display(),
            bytes = bytes.len(),
            "Captured screenshot"
        );
        Ok(Some(path))
    }

    async fn shoot(&self) -> Result<Vec<u8>, SnapError> {
        let budget = self.config.screenshot();
        match timeout(budget, self.cdp.screenshot(self.page, budget)).await {
            Ok(result) => result.map_err(SnapError::from),
            Err(_) => Err(SnapErrKind::CaptureTimeout(budget.as_millis() as u64).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdp_adapter::fake::{FakePage, FAKE_PNG};
    use cdp_adapter::AdapterErrorKind;

    fn guard(root: &Path) -> (CaptureGuard, Arc<FakePage>) {
        let fake = Arc::new(FakePage::new());
        let guard = CaptureGuard::new(fake.clone(), PageId::new(), root);
        (guard, fake)
    }

    #[tokio::test]
    async fn first_capture_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let (mut guard, _fake) = guard(dir.path());

        let path = guard
            .capture("notion", "Create a page", "Navigate to Notion workspace")
            .await
            .unwrap()
            .expect("captured");

        assert_eq!(
            path,
            dir.path()
                .join("notion/create-a-page/step-01-navigate-to-notion-workspace.png")
        );
        assert_eq!(std::fs::read(&path).unwrap(), FAKE_PNG);
        assert_eq!(guard.counter(), 1);
    }

    #[tokio::test]
    async fn unchanged_page_is_captured_once() {
        let dir = tempfile::tempdir().unwrap();
        let (mut guard, fake) = guard(dir.path());
        fake.set_url("https://trello.com/b/1");

        assert!(guard.capture("trello", "t", "one").await.unwrap().is_some());
        assert!(guard.capture("trello", "t", "two").await.unwrap().is_none());
        assert_eq!(guard.counter(), 1);

        fake.set_content("<html><body>card added</body></html>");
        let third = guard.capture("trello", "t", "three").await.unwrap().unwrap();
        assert!(third.ends_with("step-02-three.png"));
    }

    #[tokio::test]
    async fn unreadable_fingerprint_always_captures() {
        let dir = tempfile::tempdir().unwrap();
        let (mut guard, fake) = guard(dir.path());
        fake.fail("content", AdapterError::new(AdapterErrorKind::CdpIo));

        assert!(guard.capture("linear", "t", "a").await.unwrap().is_some());
        assert!(guard.capture("linear", "t", "b").await.unwrap().is_some());
        assert_eq!(guard.counter(), 2);
    }

    #[tokio::test]
    async fn failed_screenshot_still_advances_counter() {
        let dir = tempfile::tempdir().unwrap();
        let (mut guard, fake) = guard(dir.path());
        fake.fail("screenshot", AdapterError::internal("renderer crashed"));

        let err = guard.capture("notion", "t", "broken").await.unwrap_err();
        assert!(matches!(err.kind(), SnapErrKind::CaptureFailed(_)));
        assert_eq!(guard.counter(), 1);
        assert_eq!(guard.memory(), &CaptureMemory::default());

        fake.heal("screenshot");
        let path = guard.capture("notion", "t", "fixed").await.unwrap().unwrap();
        assert!(path.ends_with("step-02-fixed.png"));
    }

    #[tokio::test(start_paused = true)]
    async fn hung_screenshot_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let (mut guard, fake) = guard(dir.path());
        fake.stall("screenshot");

        let err = guard.capture("notion", "t", "slow").await.unwrap_err();
        assert_eq!(err.kind(), &SnapErrKind::CaptureTimeout(30_000));
    }

    #[tokio::test]
    async fn unwritable_root_is_an_io_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"not a dir").unwrap();
        let (mut guard, _fake) = guard(&blocker);

        let err = guard.capture("notion", "t", "x").await.unwrap_err();
        assert!(matches!(err.kind(), SnapErrKind::IoFailed(_)));
    }
}
