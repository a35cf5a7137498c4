//! Scripted recognition service.
//!
//! Each call to `open` pops the next script. The receive side walks the
//! script step by step; once it is exhausted it waits for cancellation, the
//! way a live session waits for more speech.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use waav_transcriber::core::stt::{
    RecognitionEntry, RecognitionService, RecognitionSession, ReceiveError, ResponseBatch,
    STTError, SessionReceiver, SessionSender, StreamingSettings,
};

use super::MockStats;

/// One step of a session script.
#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// Deliver a response batch
    Batch(ResponseBatch),
    /// Block until the session has received at least this many audio bytes
    WaitForAudio(usize),
    /// Stay silent for a while
    Delay(Duration),
    /// End the session with the maximum-duration condition
    MaxDuration,
    /// End the session with an error
    Fail(STTError),
}

impl ScriptStep {
    pub fn interim(text: &str) -> Self {
        Self::Batch(ResponseBatch::new(vec![RecognitionEntry::interim(text)]))
    }

    pub fn final_result(text: &str) -> Self {
        Self::Batch(ResponseBatch::new(vec![RecognitionEntry::final_result(text)]))
    }

    pub fn service_error(message: &str) -> Self {
        Self::Batch(ResponseBatch::service_error(message))
    }
}

/// What one session saw on its send side.
#[derive(Debug, Clone, Default)]
pub struct SessionRecord {
    pub settings: Option<StreamingSettings>,
    pub content: Vec<u8>,
    /// Set when content arrived before the configuration
    pub content_before_config: bool,
}

impl SessionRecord {
    pub fn contains(&self, needle: &[u8]) -> bool {
        self.content.windows(needle.len()).any(|w| w == needle)
    }
}

struct SharedRecord {
    record: Mutex<SessionRecord>,
    audio: Notify,
}

pub struct ScriptedService {
    scripts: Mutex<VecDeque<Vec<ScriptStep>>>,
    open_error: Option<STTError>,
    send_error: Option<STTError>,
    send_delay: Duration,
    sessions: Mutex<Vec<Arc<SharedRecord>>>,
    pub stats: Arc<MockStats>,
}

impl ScriptedService {
    fn build(scripts: Vec<Vec<ScriptStep>>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            open_error: None,
            send_error: None,
            send_delay: Duration::ZERO,
            sessions: Mutex::new(Vec::new()),
            stats: Arc::new(MockStats::default()),
        }
    }

    /// One script per session, in open order. Sessions opened after the
    /// scripts run out wait silently for cancellation.
    pub fn new(scripts: Vec<Vec<ScriptStep>>) -> Arc<Self> {
        Arc::new(Self::build(scripts))
    }

    /// A service whose every open fails with `error`.
    pub fn failing_open(error: STTError) -> Arc<Self> {
        Arc::new(Self {
            open_error: Some(error),
            ..Self::build(Vec::new())
        })
    }

    /// Sessions open normally but every audio send fails with `error`.
    pub fn failing_send(scripts: Vec<Vec<ScriptStep>>, error: STTError) -> Arc<Self> {
        Arc::new(Self {
            send_error: Some(error),
            ..Self::build(scripts)
        })
    }

    /// Every audio send takes `delay` before it is recorded.
    pub fn with_send_delay(scripts: Vec<Vec<ScriptStep>>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            send_delay: delay,
            ..Self::build(scripts)
        })
    }

    pub fn sessions_opened(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Snapshot of the `index`-th opened session.
    pub fn session(&self, index: usize) -> SessionRecord {
        self.sessions.lock()[index].record.lock().clone()
    }

    /// Audio received over all sessions, in order.
    pub fn all_content(&self) -> Vec<u8> {
        self.sessions
            .lock()
            .iter()
            .flat_map(|s| s.record.lock().content.clone())
            .collect()
    }
}

#[async_trait]
impl RecognitionService for ScriptedService {
    async fn open(&self, cancel: CancellationToken) -> Result<RecognitionSession, STTError> {
        if let Some(e) = &self.open_error {
            self.stats.record_open_failure();
            return Err(e.clone());
        }

        let shared = Arc::new(SharedRecord {
            record: Mutex::new(SessionRecord::default()),
            audio: Notify::new(),
        });
        self.sessions.lock().push(shared.clone());
        self.stats.record_open();

        let steps = self.scripts.lock().pop_front().unwrap_or_default();
        Ok(RecognitionSession::new(
            Box::new(ScriptedSender {
                shared: shared.clone(),
                stats: self.stats.clone(),
                error: self.send_error.clone(),
                delay: self.send_delay,
            }),
            Box::new(ScriptedReceiver {
                steps: steps.into(),
                shared,
                cancel,
            }),
        ))
    }

    fn get_provider_info(&self) -> &'static str {
        "Scripted mock recognition service"
    }
}

struct ScriptedSender {
    shared: Arc<SharedRecord>,
    stats: Arc<MockStats>,
    error: Option<STTError>,
    delay: Duration,
}

#[async_trait]
impl SessionSender for ScriptedSender {
    async fn send_config(&mut self, settings: &StreamingSettings) -> Result<(), STTError> {
        self.shared.record.lock().settings = Some(settings.clone());
        self.stats.record_config();
        Ok(())
    }

    async fn send_content(&mut self, content: Bytes) -> Result<(), STTError> {
        if let Some(e) = &self.error {
            return Err(e.clone());
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        {
            let mut record = self.shared.record.lock();
            if record.settings.is_none() {
                record.content_before_config = true;
            }
            record.content.extend_from_slice(&content);
        }
        self.stats.record_content(content.len());
        self.shared.audio.notify_one();
        Ok(())
    }
}

struct ScriptedReceiver {
    steps: VecDeque<ScriptStep>,
    shared: Arc<SharedRecord>,
    cancel: CancellationToken,
}

impl ScriptedReceiver {
    async fn wait_for_audio(&self, bytes: usize) -> Result<(), ReceiveError> {
        loop {
            if self.shared.record.lock().content.len() >= bytes {
                return Ok(());
            }
            tokio::select! {
                _ = self.cancel.cancelled() => return Err(ReceiveError::Canceled),
                _ = self.shared.audio.notified() => {}
            }
        }
    }
}

#[async_trait]
impl SessionReceiver for ScriptedReceiver {
    async fn receive(&mut self) -> Result<ResponseBatch, ReceiveError> {
        while let Some(step) = self.steps.pop_front() {
            match step {
                ScriptStep::Batch(batch) => return Ok(batch),
                ScriptStep::WaitForAudio(bytes) => self.wait_for_audio(bytes).await?,
                ScriptStep::Delay(delay) => {
                    tokio::select! {
                        _ = self.cancel.cancelled() => return Err(ReceiveError::Canceled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                ScriptStep::MaxDuration => return Err(ReceiveError::MaxDurationExceeded),
                ScriptStep::Fail(e) => return Err(ReceiveError::Failed(e)),
            }
        }
        self.cancel.cancelled().await;
        Err(ReceiveError::Canceled)
    }
}
