use serde::Deserialize;
use std::path::PathBuf;

use crate::core::stt::RecognitionHints;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values present in
/// the file override environment variables.
///
/// # Example YAML structure
/// ```yaml
/// rtp:
///   listen_addr: "0.0.0.0:5004"
///   payload_type: 111
///   max_late: 200
///
/// audio:
///   codec: "audio/opus"
///   clock_rate: 48000
///   channels: 2
///
/// recognition:
///   provider: "google"
///   language_code: "en-US"
///   interim_results: true
///   hints:
///     phrases: ["Hey ${gpt}"]
///     boost: 19
///     classes:
///       - class_id: "gpt"
///         items: ["Kit", "LiveKit"]
///
/// google:
///   endpoint: "https://speech.googleapis.com"
///   access_token: "ya29...."
///   model: "command_and_search"
///   use_enhanced: true
///   connect_timeout_secs: 10
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub rtp: Option<RtpYaml>,
    pub audio: Option<AudioYaml>,
    pub recognition: Option<RecognitionYaml>,
    pub google: Option<GoogleYaml>,
}

/// RTP ingestion configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RtpYaml {
    pub listen_addr: Option<String>,
    pub payload_type: Option<u8>,
    /// Packets buffered behind a sequence gap before it is skipped
    pub max_late: Option<u16>,
}

/// Inbound codec descriptor from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AudioYaml {
    pub codec: Option<String>,
    pub clock_rate: Option<u32>,
    pub channels: Option<u16>,
}

/// Recognition settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RecognitionYaml {
    pub provider: Option<String>,
    pub language_code: Option<String>,
    pub interim_results: Option<bool>,
    /// Replaces the built-in assistant hints entirely when present
    pub hints: Option<RecognitionHints>,
}

/// Google Speech settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GoogleYaml {
    pub endpoint: Option<String>,
    pub access_token: Option<String>,
    pub model: Option<String>,
    pub use_enhanced: Option<bool>,
    pub connect_timeout_secs: Option<u64>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file cannot be read
    /// - The YAML is malformed
    /// - Required fields have invalid types
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}
