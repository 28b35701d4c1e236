use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

static CAPTURED: AtomicU64 = AtomicU64::new(0);
static SKIPPED: AtomicU64 = AtomicU64::new(0);
static FAILED: AtomicU64 = AtomicU64::new(0);
static BYTES_WRITTEN: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CaptureMetrics {
    pub captured: u64,
    pub skipped_unchanged: u64,
    pub failed: u64,
    pub bytes_written: u64,
}

pub fn record_capture(bytes: usize) {
    CAPTURED.fetch_add(1, Ordering::Relaxed);
    BYTES_WRITTEN.fetch_add(bytes as u64, Ordering::Relaxed);
}

pub fn record_skip() {
    SKIPPED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_failure() {
    FAILED.fetch_add(1, Ordering::Relaxed);
}

pub fn snapshot() -> CaptureMetrics {
    CaptureMetrics {
        captured: CAPTURED.load(Ordering::Relaxed),
        skipped_unchanged: SKIPPED.load(Ordering::Relaxed),
        failed: FAILED.load(Ordering::Relaxed),
        bytes_written: BYTES_WRITTEN.load(Ordering::Relaxed),
    }
}
