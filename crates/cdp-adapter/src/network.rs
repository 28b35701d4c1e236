//! In-flight request bookkeeping used by the network-quiet gate.

use std::collections::HashSet;

use parking_lot::Mutex;
use tokio::time::{Duration, Instant};

#[derive(Debug)]
struct Inner {
    inflight: HashSet<String>,
    last_activity: Instant,
}

/// Tracks one page's outstanding requests.
#[derive(Debug)]
pub struct NetworkTracker {
    inner: Mutex<Inner>,
}

/// Point-in-time view of a tracker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NetworkSnapshot {
    pub inflight: usize,
    pub since_last_activity: Duration,
}

impl NetworkSnapshot {
    pub fn is_quiet(&self, window: Duration, max_inflight: u32) -> bool {
        self.inflight <= max_inflight as usize && self.since_last_activity >= window
    }
}

impl Default for NetworkTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkTracker {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                inflight: HashSet::new(),
                last_activity: Instant::now(),
            }),
        }
    }

    pub fn request_started(&self, request_id: &str) {
        let mut inner = self.inner.lock();
        inner.inflight.insert(request_id.to_string());
        inner.last_activity = Instant::now();
    }

    /// Handles both `loadingFinished` and `loadingFailed`.
    pub fn request_done(&self, request_id: &str) {
        let mut inner = self.inner.lock();
        inner.inflight.remove(request_id);
        inner.last_activity = Instant::now();
    }

    /// Forgets everything, e.g. after a main-frame navigation.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.inflight.clear();
        inner.last_activity = Instant::now();
    }

    pub fn snapshot(&self) -> NetworkSnapshot {
        let inner = self.inner.lock();
        NetworkSnapshot {
            inflight: inner.inflight.len(),
            since_last_activity: Instant::now().saturating_duration_since(inner.last_activity),
        }
    }
}
