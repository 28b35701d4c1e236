//! Run configuration.
//!
//! Loaded from YAML, then adjusted by environment variables, then by CLI
//! flags. Every section falls back to its defaults when absent.

use std::path::{Path, PathBuf};

use action_flow::RunnerConfig;
use action_primitives::ExecutorConfig;
use anyhow::{Context, Result};
use cdp_adapter::{CdpConfig, Viewport};
use perceiver_structural::DetectorConfig;
use serde::{Deserialize, Serialize};
use tracewalk_snapshot_store::CaptureConfig;
use tracing::{info, warn};

use crate::apps::AppProfile;

/// Default navigation budget for session bootstrap and `goto`.
pub const NAVIGATION_TIMEOUT_MS: u64 = 20_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub output_root: PathBuf,
    pub max_steps: usize,
    pub browser: BrowserSettings,
    pub executor: ExecutorConfig,
    pub detector: DetectorConfig,
    pub capture: CaptureConfig,
    pub login: LoginSettings,
    pub apps: Vec<AppProfile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("dataset"),
            max_steps: RunnerConfig::default().max_steps,
            browser: BrowserSettings::default(),
            executor: ExecutorConfig::default(),
            detector: DetectorConfig::default(),
            capture: CaptureConfig::default(),
            login: LoginSettings::default(),
            apps: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub headless: bool,
    /// Persistent user-data-dir, so logins survive between runs.
    pub profile_dir: PathBuf,
    pub viewport: Viewport,
    pub navigation_timeout_ms: u64,
    pub chrome_path: Option<PathBuf>,
    /// Attach to a running browser instead of launching one.
    pub websocket_url: Option<String>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: false,
            profile_dir: PathBuf::from(".tracewalk-profile"),
            viewport: Viewport::default(),
            navigation_timeout_ms: NAVIGATION_TIMEOUT_MS,
            chrome_path: None,
            websocket_url: None,
        }
    }
}

impl BrowserSettings {
    pub fn cdp_config(&self) -> CdpConfig {
        let mut cfg = CdpConfig {
            user_data_dir: Some(self.profile_dir.clone()),
            headless: self.headless,
            viewport: self.viewport,
            websocket_url: self.websocket_url.clone(),
            ..CdpConfig::default()
        };
        if let Some(path) = &self.chrome_path {
            cfg.executable = path.clone();
        }
        cfg
    }
}

/// Waits used while getting past the login page, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginSettings {
    /// `--manual-login`: time given to the operator.
    pub manual_wait_ms: u64,
    /// No credentials available: time given to the operator.
    pub credential_wait_ms: u64,
    /// The automated login stumbled.
    pub fallback_wait_ms: u64,
}

impl Default for LoginSettings {
    fn default() -> Self {
        Self {
            manual_wait_ms: 90_000,
            credential_wait_ms: 60_000,
            fallback_wait_ms: 30_000,
        }
    }
}

pub struct LoadedConfig {
    pub config: Config,
    pub path: PathBuf,
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tracewalk").join("config.yaml"))
}

/// Reads `path`, or the per-user config file; a missing file means defaults.
pub fn load_config(path: Option<&Path>) -> Result<LoadedConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => default_config_path().unwrap_or_else(|| PathBuf::from("tracewalk.yaml")),
    };

    if !path.exists() {
        warn!("Config file not found, using defaults: {}", path.display());
        return Ok(LoadedConfig {
            config: Config::default(),
            path,
        });
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: Config = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    info!("Loaded configuration from: {}", path.display());
    Ok(LoadedConfig { config, path })
}

impl Config {
    /// Applies the supported environment variables, read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let millis = |key: &str, raw: String| -> Result<u64> {
            raw.parse::<u64>()
                .with_context(|| format!("{key} must be a whole number of milliseconds, got '{raw}'"))
        };

        if let Some(raw) = get("HEADLESS") {
            self.browser.headless = raw.eq_ignore_ascii_case("true");
        }
        if let Some(raw) = get("PERSISTENT_PROFILE") {
            self.browser.profile_dir = PathBuf::from(raw);
        }
        if let Some(raw) = get("NAVIGATION_TIMEOUT_MS") {
            let ms = millis("NAVIGATION_TIMEOUT_MS", raw)?;
            self.browser.navigation_timeout_ms = ms;
            self.executor.navigation_ms = ms;
        }
        if let Some(raw) = get("NETWORKIDLE_TIMEOUT_MS") {
            self.detector.settle_ms = millis("NETWORKIDLE_TIMEOUT_MS", raw)?;
        }
        if let Some(raw) = get("CAPTURE_DELAY_MS") {
            self.detector.capture_delay_ms = millis("CAPTURE_DELAY_MS", raw)?;
        }
        if let Some(raw) = get("TRACEWALK_CHROME") {
            self.browser.chrome_path = Some(PathBuf::from(raw));
        }
        Ok(())
    }

    pub fn apply_process_env(&mut self) -> Result<()> {
        self.apply_env(|key| std::env::var(key).ok())
    }
}
