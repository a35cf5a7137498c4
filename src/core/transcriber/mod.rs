//! Streaming transcriber for one inbound audio track.
//!
//! Packets submitted by the caller pass through the frame reassembler and the
//! per-session container encoder into the transport bridge. A background
//! session manager forwards the bridge to the recognition service, rotates
//! sessions when the service enforces its maximum duration, and publishes
//! aggregated transcripts on a single ordered output stream.
//!
//! # Example
//!
//! ```rust,ignore
//! let service = Arc::new(GoogleSpeechService::connect(google_config).await?);
//! let transcriber = Transcriber::new(TranscriberConfig::default(), service)?;
//! let mut results = transcriber.take_results().unwrap();
//!
//! transcriber.submit(RtpPacket::parse(&datagram)?)?;
//! while let Some(result) = results.recv().await {
//!     println!("{:?}", result);
//! }
//! transcriber.stop().await;
//! ```

mod aggregate;
mod config;
mod ingest;
mod session;
mod stats;


pub use aggregate::aggregate;
pub use config::TranscriberConfig;
pub use stats::{StatsSnapshot, TranscriberStats};

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::core::bridge::bridge;
use crate::core::container::{EncoderFactory, OggOpusFactory};
use crate::core::rtp::{FrameReassembler, RtpPacket, SampleBuilder};
use crate::core::stt::{RecognitionResult, RecognitionService, STTError};

use ingest::Ingest;
use session::{ResultPublisher, SessionManager};

/// Capacity of the output result stream.
pub const RESULT_CHANNEL_CAPACITY: usize = 32;

/// Handle to a running transcriber.
///
/// Created once per audio track. Runs until [`Transcriber::stop`] is called or
/// until the session loop exits on an unrecoverable error.
pub struct Transcriber {
    config: TranscriberConfig,
    ingest: Arc<Ingest>,
    cancel: CancellationToken,
    finished: CancellationToken,
    stats: Arc<TranscriberStats>,
    results_tx: Mutex<Option<mpsc::Sender<RecognitionResult>>>,
    results_rx: Mutex<Option<mpsc::Receiver<RecognitionResult>>>,
    loop_handle: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl Transcriber {
    /// Start a transcriber with the default reassembler and Ogg/Opus encoder.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        config: TranscriberConfig,
        service: Arc<dyn RecognitionService>,
    ) -> Result<Self, STTError> {
        let reassembler = Box::new(SampleBuilder::new(config.max_late));
        Self::with_components(config, service, reassembler, Arc::new(OggOpusFactory))
    }

    /// Start a transcriber with caller-supplied reassembler and encoder factory.
    pub fn with_components(
        config: TranscriberConfig,
        service: Arc<dyn RecognitionService>,
        reassembler: Box<dyn FrameReassembler>,
        encoder_factory: Arc<dyn EncoderFactory>,
    ) -> Result<Self, STTError> {
        config.validate()?;

        let (writer, reader) = bridge();
        let ingest = Arc::new(Ingest::new(
            reassembler,
            encoder_factory,
            writer,
            config.codec.clock_rate,
            config.codec.channels,
        ));

        let cancel = CancellationToken::new();
        let finished = CancellationToken::new();
        let stats = Arc::new(TranscriberStats::default());
        let (tx, rx) = mpsc::channel(RESULT_CHANNEL_CAPACITY);

        let manager = SessionManager::new(
            service,
            config.streaming_settings(),
            ingest.clone(),
            reader,
            ResultPublisher::new(tx.clone(), cancel.clone(), stats.clone()),
            cancel.clone(),
            stats.clone(),
        );

        let done = finished.clone();
        let loop_handle = tokio::spawn(async move {
            let _done = done.drop_guard();
            manager.run().await;
        });

        info!(
            codec = %config.codec.mime_type,
            clock_rate = config.codec.clock_rate,
            channels = config.codec.channels,
            language = %config.language_code,
            "Transcriber started"
        );

        Ok(Self {
            config,
            ingest,
            cancel,
            finished,
            stats,
            results_tx: Mutex::new(Some(tx)),
            results_rx: Mutex::new(Some(rx)),
            loop_handle: tokio::sync::Mutex::new(Some(loop_handle)),
        })
    }

    /// Submit one inbound RTP packet. Never blocks on network I/O.
    ///
    /// Returns the first encoding error of this call, or an error once the
    /// transcriber has been stopped.
    pub fn submit(&self, packet: RtpPacket) -> Result<(), STTError> {
        self.ingest.submit(packet)
    }

    /// Take the output result stream. Returns `None` after the first call.
    ///
    /// The stream yields results in receive order and ends once
    /// [`Transcriber::stop`] has completed.
    pub fn take_results(&self) -> Option<mpsc::Receiver<RecognitionResult>> {
        self.results_rx.lock().take()
    }

    /// Stop the transcriber: cancel, wait for the session loop, close the
    /// bridge and close the result stream. Later calls are no-ops.
    pub async fn stop(&self) {
        // Held for the whole shutdown so concurrent callers return only after
        // the stream is closed.
        let mut loop_handle = self.loop_handle.lock().await;

        self.cancel.cancel();
        if let Some(handle) = loop_handle.take() {
            if let Err(e) = handle.await {
                error!(error = %e, "Transcription session loop panicked");
            }
            self.ingest.close();
            self.results_tx.lock().take();
            info!("Transcriber stopped");
        }
    }

    /// Wait until the session loop has exited, for whatever reason.
    pub async fn finished(&self) {
        self.finished.cancelled().await;
    }

    /// Whether the session loop is still running.
    pub fn is_running(&self) -> bool {
        !self.finished.is_cancelled()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn config(&self) -> &TranscriberConfig {
        &self.config
    }
}

impl Drop for Transcriber {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.ingest.close();
    }
}
