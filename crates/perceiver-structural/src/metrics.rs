//! Detector counters.
//!
//! Plain atomics; the CLI reads a snapshot at the end of a run.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

static DETECT_TOTAL: AtomicU64 = AtomicU64::new(0);
static DETECT_LAT_NS: AtomicU64 = AtomicU64::new(0);
static SIGNIFICANT_TOTAL: AtomicU64 = AtomicU64::new(0);
static PROBE_FAILURES: AtomicU64 = AtomicU64::new(0);
static UNAVAILABLE_TOTAL: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, Serialize)]
pub struct DetectorMetrics {
    pub detections: u64,
    pub avg_ms: f64,
    pub significant: u64,
    pub probe_failures: u64,
    pub unavailable: u64,
}

pub fn record_detect(significant: bool, duration: Duration) {
    DETECT_TOTAL.fetch_add(1, Ordering::Relaxed);
    DETECT_LAT_NS.fetch_add(duration_to_nanos(duration), Ordering::Relaxed);
    if significant {
        SIGNIFICANT_TOTAL.fetch_add(1, Ordering::Relaxed);
    }
}

pub fn record_probe_failure() {
    PROBE_FAILURES.fetch_add(1, Ordering::Relaxed);
}

pub fn record_unavailable() {
    UNAVAILABLE_TOTAL.fetch_add(1, Ordering::Relaxed);
}

pub fn snapshot() -> DetectorMetrics {
    let detections = DETECT_TOTAL.load(Ordering::Relaxed);
    let nanos = DETECT_LAT_NS.load(Ordering::Relaxed);
    let avg_ms = if detections == 0 {
        0.0
    } else {
        (nanos as f64 / detections as f64) / 1_000_000.0
    };
    DetectorMetrics {
        detections,
        avg_ms,
        significant: SIGNIFICANT_TOTAL.load(Ordering::Relaxed),
        probe_failures: PROBE_FAILURES.load(Ordering::Relaxed),
        unavailable: UNAVAILABLE_TOTAL.load(Ordering::Relaxed),
    }
}

fn duration_to_nanos(duration: Duration) -> u64 {
    let nanos = duration.as_nanos();
    if nanos > u64::MAX as u128 {
        u64::MAX
    } else {
        nanos as u64
    }
}
