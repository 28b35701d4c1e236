use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Fingerprint reads (url, markup).
    pub probe_ms: u64,
    pub screenshot_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            probe_ms: 5_000,
            screenshot_ms: 30_000,
        }
    }
}

impl CaptureConfig {
    pub fn probe(&self) -> Duration {
        Duration::from_millis(self.probe_ms)
    }

    pub fn screenshot(&self) -> Duration {
        Duration::from_millis(self.screenshot_ms)
    }
}
