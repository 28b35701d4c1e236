//! Browser launch configuration and Chrome discovery.

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use which::which;

/// Viewport applied to every page the adapter creates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1400,
            height: 900,
        }
    }
}

/// Configuration for launching and tuning the adapter.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CdpConfig {
    /// Chrome binary. Empty means "let discovery decide".
    pub executable: PathBuf,
    /// Persistent profile directory. `None` launches with a throwaway profile.
    pub user_data_dir: Option<PathBuf>,
    pub headless: bool,
    pub viewport: Viewport,
    /// Upper bound for a single protocol round trip.
    pub default_deadline_ms: u64,
    pub launch_timeout_ms: u64,
    pub heartbeat_interval_ms: u64,
    /// Attach to an already running browser instead of launching one.
    pub websocket_url: Option<String>,
    pub no_sandbox: bool,
}

impl Default for CdpConfig {
    fn default() -> Self {
        Self {
            executable: detect_chrome_executable().unwrap_or_default(),
            user_data_dir: None,
            headless: false,
            viewport: Viewport::default(),
            default_deadline_ms: 30_000,
            launch_timeout_ms: 20_000,
            heartbeat_interval_ms: 15_000,
            websocket_url: None,
            no_sandbox: env_flag("TRACEWALK_DISABLE_SANDBOX"),
        }
    }
}

impl CdpConfig {
    /// Profile directory to hand to Chrome, made absolute.
    pub fn resolved_profile_dir(&self) -> std::io::Result<PathBuf> {
        let dir = match &self.user_data_dir {
            Some(dir) => dir.clone(),
            None => env::temp_dir().join(format!("tracewalk-profile-{}", uuid::Uuid::new_v4().simple())),
        };
        if dir.is_absolute() {
            Ok(dir)
        } else {
            Ok(env::current_dir()?.join(dir))
        }
    }
}

fn env_flag(key: &str) -> bool {
    env::var(key)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

/// Finds a Chrome/Chromium binary: `TRACEWALK_CHROME`, then `PATH`, then
/// well-known install locations.
pub fn detect_chrome_executable() -> Option<PathBuf> {
    if let Ok(raw) = env::var("TRACEWALK_CHROME") {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            let candidate = PathBuf::from(trimmed);
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    if let Some(path) = chrome_executable_names()
        .iter()
        .find_map(|name| which(name).ok())
    {
        return Some(path);
    }

    if env_flag("TRACEWALK_SKIP_OS_PATHS") {
        return None;
    }
    os_specific_chrome_paths()
        .into_iter()
        .find(|candidate| candidate.exists())
}

fn chrome_executable_names() -> &'static [&'static str] {
    #[cfg(target_os = "windows")]
    {
        &["chrome.exe", "chromium.exe", "msedge.exe"]
    }

    #[cfg(not(target_os = "windows"))]
    {
        &[
            "google-chrome-stable",
            "google-chrome",
            "chromium",
            "chromium-browser",
        ]
    }
}

fn os_specific_chrome_paths() -> Vec<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        ["PROGRAMFILES", "PROGRAMFILES(X86)", "LOCALAPPDATA"]
            .iter()
            .filter_map(|key| env::var(key).ok())
            .map(|root| PathBuf::from(root.trim()))
            .flat_map(|root| {
                [
                    root.join("Google/Chrome/Application/chrome.exe"),
                    root.join("Chromium/Application/chrome.exe"),
                ]
            })
            .collect()
    }

    #[cfg(target_os = "macos")]
    {
        vec![
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"),
            PathBuf::from("/Applications/Chromium.app/Contents/MacOS/Chromium"),
        ]
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        vec![
            PathBuf::from("/usr/bin/google-chrome-stable"),
            PathBuf::from("/usr/bin/google-chrome"),
            PathBuf::from("/usr/bin/chromium-browser"),
            PathBuf::from("/usr/bin/chromium"),
        ]
    }
}
