mod base;
pub mod google;
mod hints;

// Re-export public types and traits
pub use base::{
    AudioEncoding, RecognitionEntry, RecognitionResult, RecognitionService, RecognitionSession,
    ReceiveError, ResponseBatch, STTError, STTResult, SessionReceiver, SessionSender,
    StreamingSettings, Transcript,
};
pub use hints::{DEFAULT_PHRASE_BOOST, HintClass, RecognitionHints};

// Re-export Google implementation
pub use google::{GoogleSpeechConfig, GoogleSpeechService};

use std::sync::Arc;

/// Supported recognition providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum STTProvider {
    /// Google Cloud Speech-to-Text v1 streaming gRPC API
    #[default]
    Google,
}

impl std::fmt::Display for STTProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            STTProvider::Google => write!(f, "google"),
        }
    }
}

impl std::str::FromStr for STTProvider {
    type Err = STTError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "google" | "google-speech" | "google_speech" => Ok(STTProvider::Google),
            _ => Err(STTError::ConfigurationError(format!(
                "Unsupported STT provider: {s}. Supported providers: google"
            ))),
        }
    }
}

/// Connect a recognition service for the given provider.
pub async fn create_recognition_service(
    provider: STTProvider,
    config: &GoogleSpeechConfig,
) -> Result<Arc<dyn RecognitionService>, STTError> {
    match provider {
        STTProvider::Google => Ok(Arc::new(GoogleSpeechService::connect(config).await?)),
    }
}

/// Get a list of all supported STT providers
pub fn get_supported_stt_providers() -> Vec<&'static str> {
    vec!["google"]
}
