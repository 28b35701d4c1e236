use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settling and probing budgets, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Upper bound on the network-quiet wait.
    pub network_idle_timeout_ms: u64,
    pub settle_ms: u64,
    pub capture_delay_ms: u64,
    /// Each probe (url, modal, overlay, markup).
    pub probe_ms: u64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            network_idle_timeout_ms: 20_000,
            settle_ms: 1_500,
            capture_delay_ms: 500,
            probe_ms: 5_000,
        }
    }
}

impl DetectorConfig {
    pub fn network_idle_timeout(&self) -> Duration {
        Duration::from_millis(self.network_idle_timeout_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn capture_delay(&self) -> Duration {
        Duration::from_millis(self.capture_delay_ms)
    }

    pub fn probe(&self) -> Duration {
        Duration::from_millis(self.probe_ms)
    }
}
