//! Mock recognition service and container encoders for transcriber tests.
//!
//! - [`ScriptedService`] replays one script of steps per opened session,
//!   records the configuration and audio each session received, and honours
//!   the cancellation token like a real backend
//! - [`RecordingFactory`] builds encoders that log which frames each session
//!   generation encoded

// Allow dead code in test infrastructure - not every test file uses every helper
#![allow(dead_code)]

pub mod encoder_mock;
pub mod recognition_mock;

pub use encoder_mock::RecordingFactory;
pub use recognition_mock::{ScriptStep, ScriptedService, SessionRecord};

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use bytes::Bytes;
use waav_transcriber::core::rtp::RtpPacket;

/// Default wait applied to every asynchronous assertion.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Calls observed by a mock service.
#[derive(Debug, Default)]
pub struct MockStats {
    pub sessions_opened: AtomicU64,
    pub open_failures: AtomicU64,
    pub configs_sent: AtomicU64,
    pub content_chunks: AtomicU64,
    pub content_bytes: AtomicU64,
}

impl MockStats {
    pub fn record_open(&self) {
        self.sessions_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_open_failure(&self) {
        self.open_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_config(&self) {
        self.configs_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_content(&self, len: usize) {
        self.content_chunks.fetch_add(1, Ordering::Relaxed);
        self.content_bytes.fetch_add(len as u64, Ordering::Relaxed);
    }

    pub fn summary(&self) -> String {
        format!(
            "sessions={} open_failures={} configs={} chunks={} bytes={}",
            self.sessions_opened.load(Ordering::Relaxed),
            self.open_failures.load(Ordering::Relaxed),
            self.configs_sent.load(Ordering::Relaxed),
            self.content_chunks.load(Ordering::Relaxed),
            self.content_bytes.load(Ordering::Relaxed),
        )
    }
}

/// One 20 ms Opus packet at 48 kHz carrying `payload`.
pub fn opus_packet(seq: u16, payload: &[u8]) -> RtpPacket {
    RtpPacket::new(
        seq,
        u32::from(seq).wrapping_mul(960),
        Bytes::copy_from_slice(payload),
    )
}

/// Poll `condition` until it holds or [`TEST_TIMEOUT`] elapses.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(TEST_TIMEOUT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
