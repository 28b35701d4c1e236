//! Launching Chromium and locating its DevTools endpoint.

use std::fs;
use std::time::Duration;

use anyhow::{anyhow, Result};
use chromiumoxide::async_process::Child;
use chromiumoxide::browser::BrowserConfig;
use futures::io::{AsyncBufReadExt, BufReader};
use futures::stream::StreamExt;
use serde_json::json;
use tracing::info;

use crate::config::CdpConfig;
use crate::error::{AdapterError, AdapterErrorKind};

const BASE_ARGS: &[&str] = &[
    "--disable-background-networking",
    "--disable-background-timer-throttling",
    "--disable-breakpad",
    "--disable-client-side-phishing-detection",
    "--disable-component-update",
    "--disable-default-apps",
    "--disable-dev-shm-usage",
    "--disable-hang-monitor",
    "--disable-popup-blocking",
    "--disable-prompt-on-repost",
    "--disable-sync",
    "--metrics-recording-only",
    "--no-first-run",
    "--no-default-browser-check",
    "--password-store=basic",
    "--remote-allow-origins=*",
    "--use-mock-keychain",
];

/// Command-line switches for a launch with `cfg`.
pub fn chrome_args(cfg: &CdpConfig) -> Vec<String> {
    let mut args: Vec<String> = BASE_ARGS.iter().map(|arg| arg.to_string()).collect();
    args.push(format!(
        "--window-size={},{}",
        cfg.viewport.width, cfg.viewport.height
    ));
    if cfg.headless {
        args.push("--headless=new".into());
        args.push("--hide-scrollbars".into());
        args.push("--mute-audio".into());
    }
    args
}

pub(crate) fn browser_config(cfg: &CdpConfig) -> Result<BrowserConfig, AdapterError> {
    if !cfg.executable.as_os_str().is_empty() && !cfg.executable.exists() {
        return Err(AdapterError::new(AdapterErrorKind::CdpIo)
            .with_hint(format!(
                "chrome executable not found at {}",
                cfg.executable.display()
            ))
            .with_data(json!({
                "expected": cfg.executable,
                "hint": "Set TRACEWALK_CHROME to the full path of chrome/chromium."
            })));
    }

    let profile_dir = cfg.resolved_profile_dir().map_err(|err| {
        AdapterError::internal(format!("failed to resolve user-data-dir: {err}"))
    })?;
    fs::create_dir_all(&profile_dir).map_err(|err| {
        AdapterError::internal(format!(
            "failed to create user-data-dir {}: {err}",
            profile_dir.display()
        ))
    })?;

    let mut builder = BrowserConfig::builder()
        .request_timeout(Duration::from_millis(cfg.default_deadline_ms))
        .launch_timeout(Duration::from_millis(cfg.launch_timeout_ms))
        .window_size(cfg.viewport.width, cfg.viewport.height)
        .args(chrome_args(cfg))
        .user_data_dir(&profile_dir);

    if !cfg.headless {
        builder = builder.with_head();
    }
    if cfg.no_sandbox {
        builder = builder.no_sandbox();
    }
    if !cfg.executable.as_os_str().is_empty() {
        builder = builder.chrome_executable(cfg.executable.clone());
    }

    info!(
        target: "cdp-transport",
        headless = cfg.headless,
        profile = %profile_dir.display(),
        "prepared chromium launch"
    );

    builder
        .build()
        .map_err(|err| AdapterError::internal(format!("browser config error: {err}")))
}

pub(crate) async fn launch_browser(
    config: BrowserConfig,
    wait: Duration,
) -> Result<(Child, String), AdapterError> {
    let mut child = config
        .launch()
        .map_err(|err| AdapterError::internal(format!("failed to launch chromium: {err}")))?;

    let ws_url = extract_ws_url(&mut child, wait)
        .await
        .map_err(|err| AdapterError::new(AdapterErrorKind::CdpIo).with_hint(err.to_string()))?;

    Ok((child, ws_url))
}

/// Reads Chromium's stderr until it announces its DevTools websocket.
async fn extract_ws_url(child: &mut Child, wait: Duration) -> Result<String> {
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("chromium process missing stderr handle"))?;
    let mut lines = BufReader::new(stderr).lines();
    let mut captured = Vec::new();

    let reader = async {
        while let Some(line) = lines.next().await {
            let line = line?;
            if let Some(ws) = parse_devtools_line(&line) {
                return Ok(ws);
            }
            if captured.len() < 8 {
                captured.push(line);
            }
        }
        Err(anyhow!(
            "chromium exited before exposing devtools websocket url. stderr preview: {}",
            captured.join(" | ")
        ))
    };

    tokio::time::timeout(wait, reader)
        .await
        .map_err(|_| anyhow!("timed out waiting for chromium devtools websocket url"))?
}

fn parse_devtools_line(line: &str) -> Option<String> {
    let (_, ws) = line.rsplit_once("listening on ")?;
    let ws = ws.trim();
    (ws.starts_with("ws") && ws.contains("devtools/browser")).then(|| ws.to_string())
}
