use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared between the transcriber handle and its background tasks.
#[derive(Debug, Default)]
pub struct TranscriberStats {
    sessions_opened: AtomicU64,
    rotations: AtomicU64,
    results_published: AtomicU64,
    bytes_forwarded: AtomicU64,
    service_errors_skipped: AtomicU64,
}

/// Point-in-time copy of [`TranscriberStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub sessions_opened: u64,
    pub rotations: u64,
    pub results_published: u64,
    pub bytes_forwarded: u64,
    pub service_errors_skipped: u64,
}

impl TranscriberStats {
    pub fn record_session_opened(&self) {
        self.sessions_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rotation(&self) {
        self.rotations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_result_published(&self) {
        self.results_published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_bytes_forwarded(&self, n: usize) {
        self.bytes_forwarded.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn record_service_error_skipped(&self) {
        self.service_errors_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            sessions_opened: self.sessions_opened.load(Ordering::Relaxed),
            rotations: self.rotations.load(Ordering::Relaxed),
            results_published: self.results_published.load(Ordering::Relaxed),
            bytes_forwarded: self.bytes_forwarded.load(Ordering::Relaxed),
            service_errors_skipped: self.service_errors_skipped.load(Ordering::Relaxed),
        }
    }
}
