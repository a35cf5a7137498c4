//! Recognition session lifecycle.
//!
//! The manager runs as one background task and walks an explicit state
//! machine:
//!
//! ```text
//! Connecting ──► Streaming ──► Draining(Rotate) ──► Connecting
//!     │              │
//!     │              ├──────► Draining(SendFailed) ──► Closed
//!     │              └──────► Draining(Shutdown) ──► Closed
//!     └──────────────────────────────────────────► Closed
//! ```
//!
//! While streaming, a send task forwards bridge bytes to the service and the
//! manager itself receives and publishes results. Draining always waits for
//! the send task to exit and take back the bridge reader before the encoder
//! or the session is touched.
//!
//! A failed send ends the send task and raises a flag on the session. The
//! manager keeps receiving for [`SEND_FAILURE_GRACE`] so a rotation or a
//! receive error reported by the service still wins; otherwise the send error
//! is published and the loop stops.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::aggregate::aggregate;
use super::ingest::Ingest;
use super::stats::TranscriberStats;
use crate::core::bridge::BridgeReader;
use crate::core::stt::{
    ReceiveError, RecognitionResult, RecognitionService, RecognitionSession, STTError,
    SessionReceiver, SessionSender, StreamingSettings,
};

/// How long the receiver may still report results after a failed send.
pub(crate) const SEND_FAILURE_GRACE: Duration = Duration::from_millis(250);

/// Why a session is being drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DrainReason {
    /// The service hit its maximum session duration; open a new session.
    Rotate,
    /// Sending audio failed and the receiver had nothing to add; publish the
    /// send error and stop the loop.
    SendFailed,
    /// Cancellation or an unrecoverable receive error; stop the loop.
    Shutdown,
}

/// What the send task hands back when it exits.
pub(crate) struct SendOutcome {
    pub(crate) reader: BridgeReader,
    pub(crate) error: Option<STTError>,
}

pub(crate) struct ActiveSession {
    receiver: Box<dyn SessionReceiver>,
    send_task: JoinHandle<SendOutcome>,
    stop_sending: CancellationToken,
    // raised by the send task when a send fails
    send_failed: CancellationToken,
    grace_deadline: Option<Instant>,
}

pub(crate) enum SessionState {
    Connecting,
    Streaming(ActiveSession),
    Draining(ActiveSession, DrainReason),
    Closed,
}

impl SessionState {
    fn name(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Streaming(_) => "streaming",
            Self::Draining(..) => "draining",
            Self::Closed => "closed",
        }
    }
}

/// Publishes results without outliving cancellation.
#[derive(Clone)]
pub(crate) struct ResultPublisher {
    tx: mpsc::Sender<RecognitionResult>,
    cancel: CancellationToken,
    stats: Arc<TranscriberStats>,
}

impl ResultPublisher {
    pub(crate) fn new(
        tx: mpsc::Sender<RecognitionResult>,
        cancel: CancellationToken,
        stats: Arc<TranscriberStats>,
    ) -> Self {
        Self { tx, cancel, stats }
    }

    /// Returns false if the result was not delivered.
    pub(crate) async fn publish(&self, result: RecognitionResult) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                debug!("Transcriber canceled, dropping result");
                false
            }
            sent = self.tx.send(result) => match sent {
                Ok(()) => {
                    self.stats.record_result_published();
                    true
                }
                Err(_) => {
                    debug!("Result receiver dropped");
                    false
                }
            }
        }
    }
}

pub(crate) struct SessionManager {
    service: Arc<dyn RecognitionService>,
    settings: StreamingSettings,
    ingest: Arc<Ingest>,
    // Owned here between sessions, by the send task during a session.
    reader: Option<BridgeReader>,
    publisher: ResultPublisher,
    cancel: CancellationToken,
    stats: Arc<TranscriberStats>,
}

impl SessionManager {
    pub(crate) fn new(
        service: Arc<dyn RecognitionService>,
        settings: StreamingSettings,
        ingest: Arc<Ingest>,
        reader: BridgeReader,
        publisher: ResultPublisher,
        cancel: CancellationToken,
        stats: Arc<TranscriberStats>,
    ) -> Self {
        Self {
            service,
            settings,
            ingest,
            reader: Some(reader),
            publisher,
            cancel,
            stats,
        }
    }

    /// Drive the state machine until it reaches `Closed`.
    pub(crate) async fn run(mut self) {
        let mut state = SessionState::Connecting;
        loop {
            let previous = state.name();
            state = match state {
                SessionState::Connecting => self.connect().await,
                SessionState::Streaming(active) => self.stream(active).await,
                SessionState::Draining(active, reason) => self.drain(active, reason).await,
                SessionState::Closed => break,
            };
            if previous != state.name() {
                debug!(from = previous, to = state.name(), "Session state transition");
            }
        }
        info!("Transcription session loop exited");
    }

    pub(crate) async fn connect(&mut self) -> SessionState {
        if self.cancel.is_cancelled() {
            return SessionState::Closed;
        }

        debug!(language = %self.settings.language_code, "Opening recognition session");

        let opened = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return SessionState::Closed,
            opened = self.service.open(self.cancel.clone()) => opened,
        };
        let RecognitionSession {
            mut sender,
            receiver,
        } = match opened {
            Ok(session) => session,
            Err(e) => return self.fail_connect(e).await,
        };

        let configured = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return SessionState::Closed,
            configured = sender.send_config(&self.settings) => configured,
        };
        if let Err(e) = configured {
            return self.fail_connect(e).await;
        }

        let Some(reader) = self.reader.take() else {
            error!("Bridge reader missing while connecting");
            return SessionState::Closed;
        };

        let stop_sending = self.cancel.child_token();
        let send_failed = CancellationToken::new();
        let send_task = tokio::spawn(forward_audio(
            sender,
            reader,
            stop_sending.clone(),
            send_failed.clone(),
            self.stats.clone(),
        ));

        self.stats.record_session_opened();
        info!(
            provider = self.service.get_provider_info(),
            "Recognition session started"
        );

        SessionState::Streaming(ActiveSession {
            receiver,
            send_task,
            stop_sending,
            send_failed,
            grace_deadline: None,
        })
    }

    async fn fail_connect(&self, e: STTError) -> SessionState {
        if self.cancel.is_cancelled() {
            debug!(error = %e, "Session open aborted by cancellation");
        } else {
            error!(error = %e, "Failed to start recognition session");
            self.publisher.publish(Err(e)).await;
        }
        SessionState::Closed
    }

    pub(crate) async fn stream(&mut self, mut active: ActiveSession) -> SessionState {
        let received = tokio::select! {
            biased;
            received = active.receiver.receive() => Some(received),
            _ = self.cancel.cancelled() => Some(Err(ReceiveError::Canceled)),
            _ = send_failure_grace(&active.send_failed, &mut active.grace_deadline) => None,
        };
        let Some(received) = received else {
            warn!("No response after failed audio send, ending recognition session");
            return SessionState::Draining(active, DrainReason::SendFailed);
        };

        match received {
            Ok(batch) => {
                match aggregate(&batch) {
                    Some(transcript) => {
                        debug!(
                            text = %transcript.text,
                            is_final = transcript.is_final,
                            "Recognition result"
                        );
                        self.publisher.publish(Ok(transcript)).await;
                    }
                    None => {
                        self.stats.record_service_error_skipped();
                        warn!(
                            error = batch.service_error.as_deref().unwrap_or_default(),
                            "Skipping response flagged as service error"
                        );
                    }
                }
                SessionState::Streaming(active)
            }
            Err(ReceiveError::MaxDurationExceeded) => {
                info!("Maximum session duration reached, rotating recognition session");
                SessionState::Draining(active, DrainReason::Rotate)
            }
            Err(ReceiveError::Canceled) => {
                debug!("Recognition session canceled");
                SessionState::Draining(active, DrainReason::Shutdown)
            }
            Err(ReceiveError::Failed(e)) => {
                if self.cancel.is_cancelled() {
                    debug!(error = %e, "Receive failed after cancellation");
                } else {
                    error!(error = %e, "Failed to receive from recognition session");
                    self.publisher.publish(Err(e)).await;
                }
                SessionState::Draining(active, DrainReason::Shutdown)
            }
        }
    }

    pub(crate) async fn drain(&mut self, active: ActiveSession, reason: DrainReason) -> SessionState {
        let ActiveSession {
            receiver,
            send_task,
            stop_sending,
            ..
        } = active;

        stop_sending.cancel();
        let joined = send_task.await;
        drop(receiver);

        let send_error = match joined {
            Ok(SendOutcome { reader, error }) => {
                self.reader = Some(reader);
                error
            }
            Err(e) => {
                error!(error = %e, "Audio send task failed");
                if !self.cancel.is_cancelled() {
                    self.publisher
                        .publish(Err(STTError::AudioProcessingError(format!(
                            "audio send task failed: {e}"
                        ))))
                        .await;
                }
                return SessionState::Closed;
            }
        };

        match reason {
            DrainReason::Rotate => {
                if let Some(e) = send_error {
                    debug!(error = %e, "Send failure superseded by session rotation");
                }
                self.ingest.reset_container();
                self.stats.record_rotation();
                SessionState::Connecting
            }
            DrainReason::SendFailed => {
                let e = send_error
                    .unwrap_or_else(|| STTError::NetworkError("audio send failed".to_string()));
                if self.cancel.is_cancelled() {
                    debug!(error = %e, "Send failed after cancellation");
                } else {
                    error!(error = %e, "Failed to send audio to recognition session");
                    self.publisher.publish(Err(e)).await;
                }
                SessionState::Closed
            }
            DrainReason::Shutdown => {
                if let Some(e) = send_error {
                    debug!(error = %e, "Send failure superseded by session shutdown");
                }
                SessionState::Closed
            }
        }
    }
}

/// Resolves once `failed` is raised and the grace period that started then
/// has elapsed. The deadline survives across calls.
async fn send_failure_grace(failed: &CancellationToken, deadline: &mut Option<Instant>) {
    failed.cancelled().await;
    let deadline = *deadline.get_or_insert_with(|| Instant::now() + SEND_FAILURE_GRACE);
    tokio::time::sleep_until(deadline).await;
}

/// Forward bridge bytes to the session until the bridge closes, the send
/// fails or `stop` is raised. A failed send raises `failed`. Hands the reader
/// and the send error back to the manager.
pub(crate) async fn forward_audio(
    mut sender: Box<dyn SessionSender>,
    mut reader: BridgeReader,
    stop: CancellationToken,
    failed: CancellationToken,
    stats: Arc<TranscriberStats>,
) -> SendOutcome {
    let mut error = None;
    loop {
        let chunk: Bytes = tokio::select! {
            biased;
            _ = stop.cancelled() => break,
            chunk = reader.read() => match chunk {
                Some(chunk) => chunk,
                None => {
                    debug!("Bridge closed, audio send task exiting");
                    break;
                }
            },
        };
        if chunk.is_empty() {
            continue;
        }

        let len = chunk.len();
        let sent = tokio::select! {
            biased;
            _ = stop.cancelled() => break,
            sent = sender.send_content(chunk) => sent,
        };
        match sent {
            Ok(()) => {
                stats.record_bytes_forwarded(len);
                debug!(bytes = len, "Sent audio content to recognition session");
            }
            Err(e) => {
                warn!(error = %e, "Failed to send audio content to recognition session");
                error = Some(e);
                failed.cancel();
                break;
            }
        }
    }
    SendOutcome { reader, error }
}
