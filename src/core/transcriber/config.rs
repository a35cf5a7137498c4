//! Transcriber configuration.

use serde::{Deserialize, Serialize};

use crate::core::rtp::{DEFAULT_MAX_LATE, RtpCodecParameters};
use crate::core::stt::{AudioEncoding, RecognitionHints, STTError, StreamingSettings};

/// Resolved configuration of one transcriber instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriberConfig {
    /// Codec descriptor of the inbound track
    pub codec: RtpCodecParameters,

    /// BCP-47 language code for recognition
    #[serde(default = "default_language_code")]
    pub language_code: String,

    /// Boosted phrases and class vocabularies
    #[serde(default)]
    pub hints: RecognitionHints,

    /// Enable interim (partial) results
    #[serde(default = "default_true")]
    pub interim_results: bool,

    /// Recognition model, if the backend supports model selection
    #[serde(default)]
    pub model: Option<String>,

    #[serde(default = "default_true")]
    pub use_enhanced: bool,

    /// Packets buffered behind a sequence gap before it is skipped
    #[serde(default = "default_max_late")]
    pub max_late: u16,
}

fn default_language_code() -> String {
    "en-US".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_late() -> u16 {
    DEFAULT_MAX_LATE
}

impl Default for TranscriberConfig {
    fn default() -> Self {
        Self {
            codec: RtpCodecParameters::opus(),
            language_code: default_language_code(),
            hints: RecognitionHints::default(),
            interim_results: true,
            model: None,
            use_enhanced: true,
            max_late: DEFAULT_MAX_LATE,
        }
    }
}

impl TranscriberConfig {
    pub fn new(codec: RtpCodecParameters, language_code: impl Into<String>) -> Self {
        Self {
            codec,
            language_code: language_code.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), STTError> {
        self.codec.validate()?;

        if self.language_code.trim().is_empty() {
            return Err(STTError::ConfigurationError(
                "language code must not be empty".to_string(),
            ));
        }

        let missing = self.hints.undeclared_classes();
        if !missing.is_empty() {
            return Err(STTError::ConfigurationError(format!(
                "phrases reference undeclared classes: {}",
                missing.join(", ")
            )));
        }

        if !self.hints.boost.is_finite() || self.hints.boost < 0.0 {
            return Err(STTError::ConfigurationError(format!(
                "invalid phrase boost {}",
                self.hints.boost
            )));
        }

        Ok(())
    }

    /// Session configuration sent at the start of every recognition session.
    pub fn streaming_settings(&self) -> StreamingSettings {
        StreamingSettings {
            sample_rate_hertz: self.codec.clock_rate,
            audio_channel_count: self.codec.channels,
            encoding: AudioEncoding::OggOpus,
            language_code: self.language_code.clone(),
            hints: self.hints.clone(),
            interim_results: self.interim_results,
            model: self.model.clone(),
            use_enhanced: self.use_enhanced,
        }
    }
}
