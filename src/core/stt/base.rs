//! Base traits and types for streaming recognition backends.
//!
//! A recognition backend is reached through three small abstractions:
//!
//! - [`RecognitionService`] opens one bounded-duration session at a time
//! - [`SessionSender`] carries the one-time configuration and the audio content
//! - [`SessionReceiver`] yields response batches until the session terminates
//!
//! The sender and receiver halves are split at open time so that the send task
//! and the receive loop of the transcriber can own them independently.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::hints::RecognitionHints;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while transcribing a track.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum STTError {
    /// Invalid or unsupported configuration
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Opening the recognition session failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Credentials were rejected by the service
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Transport-level failure (timeouts, resets)
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Error reported by the recognition provider
    #[error("Provider error: {0}")]
    ProviderError(String),

    /// Failure while moving audio through the pipeline
    #[error("Audio processing error: {0}")]
    AudioProcessingError(String),

    /// Audio did not match the expected format
    #[error("Invalid audio format: {0}")]
    InvalidAudioFormat(String),

    /// Container serialization failed
    #[error("Encoding error: {0}")]
    EncodingError(String),
}

/// Result type for transcription operations.
pub type STTResult<T> = Result<T, STTError>;

/// Terminal conditions of a session's receive side.
///
/// Only [`ReceiveError::Failed`] is an error from the caller's point of view.
/// The other two variants are expected protocol events.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReceiveError {
    /// The service closed the session because it reached its maximum duration.
    #[error("maximum session duration exceeded")]
    MaxDurationExceeded,

    /// The session was canceled through the transcriber's cancellation signal.
    #[error("session canceled")]
    Canceled,

    /// Any other failure.
    #[error(transparent)]
    Failed(#[from] STTError),
}

// =============================================================================
// Recognition Results
// =============================================================================

/// One transcript value published on the output stream.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Transcript {
    /// Accumulated text for the current utterance
    pub text: String,
    /// Whether the service considers this utterance settled
    pub is_final: bool,
}

impl Transcript {
    pub fn new(text: impl Into<String>, is_final: bool) -> Self {
        Self {
            text: text.into(),
            is_final,
        }
    }
}

impl fmt::Display for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_final { "final" } else { "interim" };
        write!(f, "[{kind}] {}", self.text)
    }
}

/// Item of the transcriber's output stream: either an error or a transcript.
pub type RecognitionResult = Result<Transcript, STTError>;

/// A single result entry within a response batch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecognitionEntry {
    /// Transcript of the top alternative (empty if the service sent none)
    pub transcript: String,
    /// Whether this entry is final
    pub is_final: bool,
}

impl RecognitionEntry {
    pub fn interim(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: false,
        }
    }

    pub fn final_result(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: true,
        }
    }
}

/// One response message from the recognition service.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResponseBatch {
    /// Result entries in the order the service sent them
    pub results: Vec<RecognitionEntry>,
    /// Set when the service flagged this response as an error
    pub service_error: Option<String>,
}

impl ResponseBatch {
    pub fn new(results: Vec<RecognitionEntry>) -> Self {
        Self {
            results,
            service_error: None,
        }
    }

    pub fn service_error(message: impl Into<String>) -> Self {
        Self {
            results: Vec::new(),
            service_error: Some(message.into()),
        }
    }

    pub fn is_service_error(&self) -> bool {
        self.service_error.is_some()
    }
}

// =============================================================================
// Session Configuration
// =============================================================================

/// Container encoding of the audio content sent to the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioEncoding {
    /// Opus frames in an Ogg container
    #[default]
    OggOpus,
}

impl AudioEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OggOpus => "ogg_opus",
        }
    }
}

/// One-time configuration sent at the start of every recognition session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamingSettings {
    pub sample_rate_hertz: u32,
    pub audio_channel_count: u16,
    pub encoding: AudioEncoding,
    pub language_code: String,
    pub hints: RecognitionHints,
    pub interim_results: bool,
    /// Provider model name, if the provider supports model selection
    pub model: Option<String>,
    /// Request the provider's enhanced model variant
    pub use_enhanced: bool,
}

// =============================================================================
// Service Traits
// =============================================================================

/// Sending half of a recognition session.
#[async_trait]
pub trait SessionSender: Send {
    /// Send the one-time session configuration. Must precede any content.
    async fn send_config(&mut self, settings: &StreamingSettings) -> Result<(), STTError>;

    /// Send a chunk of container bytes.
    async fn send_content(&mut self, content: Bytes) -> Result<(), STTError>;
}

/// Receiving half of a recognition session.
#[async_trait]
pub trait SessionReceiver: Send {
    /// Wait for the next response batch.
    ///
    /// Returns [`ReceiveError::Canceled`] once the cancellation token given to
    /// [`RecognitionService::open`] is raised.
    async fn receive(&mut self) -> Result<ResponseBatch, ReceiveError>;
}

/// An opened recognition session, split into its two halves.
pub struct RecognitionSession {
    pub sender: Box<dyn SessionSender>,
    pub receiver: Box<dyn SessionReceiver>,
}

impl RecognitionSession {
    pub fn new(sender: Box<dyn SessionSender>, receiver: Box<dyn SessionReceiver>) -> Self {
        Self { sender, receiver }
    }
}

impl fmt::Debug for RecognitionSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecognitionSession").finish_non_exhaustive()
    }
}

/// A streaming speech recognition service.
#[async_trait]
pub trait RecognitionService: Send + Sync {
    /// Open a new session bound to `cancel`.
    async fn open(&self, cancel: CancellationToken) -> Result<RecognitionSession, STTError>;

    /// Short human-readable description of the backend.
    fn get_provider_info(&self) -> &'static str;
}
