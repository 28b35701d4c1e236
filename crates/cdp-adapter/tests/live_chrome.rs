//! Drives a real Chromium through `CdpAdapter`.
//!
//! Skipped unless `TRACEWALK_REAL_CHROME=1`; point `TRACEWALK_CHROME` at the
//! binary when it is not on PATH.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use cdp_adapter::{detect_chrome_executable, Cdp, CdpAdapter, CdpConfig, ElementQuery, WaitGate};
use tempfile::TempDir;

fn real_chrome_enabled() -> bool {
    env::var("TRACEWALK_REAL_CHROME")
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

async fn start_adapter() -> (Arc<CdpAdapter>, TempDir) {
    let profile = tempfile::tempdir().expect("temporary chrome profile");
    let cfg = CdpConfig {
        headless: true,
        executable: detect_chrome_executable().unwrap_or_default(),
        user_data_dir: Some(profile.path().to_path_buf()),
        ..CdpConfig::default()
    };
    let adapter = Arc::new(CdpAdapter::new(cfg));
    Arc::clone(&adapter).start().await.expect("adapter start");
    (adapter, profile)
}

const FORM_PAGE: &str = "data:text/html,<title>form</title><input id='q'><button id='go' onclick=\"document.title='clicked'\">Go</button>";

#[tokio::test]
async fn navigates_types_and_clicks() {
    if !real_chrome_enabled() {
        eprintln!("skipping live chrome test (TRACEWALK_REAL_CHROME not set)");
        return;
    }

    let (adapter, _profile) = start_adapter().await;
    let page = adapter.create_page("about:blank").await.expect("page");

    adapter
        .navigate(page, FORM_PAGE, Duration::from_secs(15))
        .await
        .expect("navigate");
    adapter
        .wait_basic(page, WaitGate::DomReady, Duration::from_secs(5))
        .await
        .expect("dom ready");

    let input = ElementQuery::css("#q");
    assert_eq!(adapter.count(page, &input).await.expect("count"), 1);
    adapter
        .fill(page, &input, "", Duration::from_secs(5))
        .await
        .expect("fill");
    adapter.focus(page, &input, Duration::from_secs(5)).await.expect("focus");
    adapter
        .type_text(page, "rust", Duration::from_millis(10))
        .await
        .expect("type");
    let value = adapter
        .evaluate_script(page, "document.querySelector('#q').value")
        .await
        .expect("value");
    assert_eq!(value.as_str(), Some("rust"));

    adapter
        .click(page, &ElementQuery::css("#go"), Duration::from_secs(5))
        .await
        .expect("click");
    let title = adapter.evaluate_script(page, "document.title").await.expect("title");
    assert_eq!(title.as_str(), Some("clicked"));

    let png = adapter.screenshot(page, Duration::from_secs(10)).await.expect("screenshot");
    assert!(png.starts_with(b"\x89PNG"));

    adapter.shutdown().await;
}
