//! Configuration module for the transcriber service
//!
//! This module handles configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//!
//! # Example
//! ```rust,no_run
//! use waav_transcriber::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Listening for RTP on {}", config.rtp_listen_addr);
//! # Ok(())
//! # }
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

mod env;
mod merge;
mod validation;
mod yaml;

pub use yaml::YamlConfig;

use crate::core::rtp::RtpCodecParameters;
use crate::core::stt::{GoogleSpeechConfig, RecognitionHints, STTProvider};
use crate::core::transcriber::TranscriberConfig;

/// Resolved configuration of the transcriber binary
#[derive(Clone)]
pub struct ServerConfig {
    // RTP ingestion
    /// UDP address the RTP listener binds to
    pub rtp_listen_addr: SocketAddr,
    /// Payload type of the audio track; other payload types are ignored
    pub rtp_payload_type: u8,
    pub rtp_max_late: u16,

    // Inbound codec
    pub audio_codec: String,
    pub audio_clock_rate: u32,
    pub audio_channels: u16,

    // Recognition
    pub stt_provider: STTProvider,
    pub language_code: String,
    pub interim_results: bool,
    pub hints: RecognitionHints,

    // Google Speech
    pub google_speech_endpoint: String,
    pub google_access_token: Option<String>,
    pub google_speech_model: String,
    pub google_use_enhanced: bool,
    pub google_connect_timeout_secs: u64,
}

/// Implement Drop to zeroize all secret fields when ServerConfig is dropped.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut token) = self.google_access_token {
            token.zeroize();
        }
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("rtp_listen_addr", &self.rtp_listen_addr)
            .field("rtp_payload_type", &self.rtp_payload_type)
            .field("rtp_max_late", &self.rtp_max_late)
            .field("audio_codec", &self.audio_codec)
            .field("audio_clock_rate", &self.audio_clock_rate)
            .field("audio_channels", &self.audio_channels)
            .field("stt_provider", &self.stt_provider)
            .field("language_code", &self.language_code)
            .field("interim_results", &self.interim_results)
            .field("google_speech_endpoint", &self.google_speech_endpoint)
            .field(
                "google_access_token",
                &self.google_access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("google_speech_model", &self.google_speech_model)
            .field("google_use_enhanced", &self.google_use_enhanced)
            .finish_non_exhaustive()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables and defaults
    ///
    /// The .env file is loaded in main.rs at application startup, so its values
    /// are already visible as environment variables here.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let config = merge::merge_config(None)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// After loading and merging, performs validation on the final configuration.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let yaml_config = yaml::YamlConfig::from_file(path)?;
        let config = merge::merge_config(Some(yaml_config))?;
        validation::validate(&config)?;
        Ok(config)
    }

    pub fn codec_parameters(&self) -> RtpCodecParameters {
        RtpCodecParameters {
            mime_type: self.audio_codec.clone(),
            clock_rate: self.audio_clock_rate,
            channels: self.audio_channels,
            payload_type: self.rtp_payload_type,
        }
    }

    /// Configuration for one transcriber instance
    pub fn transcriber_config(&self) -> TranscriberConfig {
        TranscriberConfig {
            codec: self.codec_parameters(),
            language_code: self.language_code.clone(),
            hints: self.hints.clone(),
            interim_results: self.interim_results,
            model: Some(self.google_speech_model.clone()),
            use_enhanced: self.google_use_enhanced,
            max_late: self.rtp_max_late,
        }
    }

    /// Configuration for the Google Speech backend
    pub fn google_speech_config(&self) -> GoogleSpeechConfig {
        let mut config = GoogleSpeechConfig::default();
        config.endpoint = self.google_speech_endpoint.clone();
        config.access_token = self.google_access_token.clone();
        config.connect_timeout_secs = self.google_connect_timeout_secs;
        config
    }
}
