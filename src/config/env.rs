//! Environment variable loading.

use std::env;
use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;

use super::ServerConfig;
use crate::core::stt::google::{DEFAULT_ENDPOINT, DEFAULT_MODEL};
use crate::core::stt::{RecognitionHints, STTProvider};

pub(crate) const DEFAULT_RTP_LISTEN_ADDR: &str = "0.0.0.0:5004";

fn env_string(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T>(key: &str, default: T) -> Result<T, Box<dyn std::error::Error>>
where
    T: FromStr,
    T::Err: Display,
{
    match env_string(key) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|e| format!("Invalid value for {key}: '{value}' ({e})").into()),
        None => Ok(default),
    }
}

pub(crate) fn parse_bool(key: &str, value: &str) -> Result<bool, Box<dyn std::error::Error>> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(format!("Invalid boolean for {key}: '{value}'").into()),
    }
}

fn env_bool(key: &str, default: bool) -> Result<bool, Box<dyn std::error::Error>> {
    match env_string(key) {
        Some(value) => parse_bool(key, &value),
        None => Ok(default),
    }
}

pub(crate) fn parse_listen_addr(value: &str) -> Result<SocketAddr, Box<dyn std::error::Error>> {
    value
        .trim()
        .parse::<SocketAddr>()
        .map_err(|e| format!("Invalid RTP listen address '{value}': {e}").into())
}

/// Build a configuration from environment variables and defaults.
pub(crate) fn load_from_env() -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let listen_addr =
        env_string("RTP_LISTEN_ADDR").unwrap_or_else(|| DEFAULT_RTP_LISTEN_ADDR.to_string());
    let stt_provider = match env_string("STT_PROVIDER") {
        Some(name) => name.parse::<STTProvider>()?,
        None => STTProvider::default(),
    };

    Ok(ServerConfig {
        rtp_listen_addr: parse_listen_addr(&listen_addr)?,
        rtp_payload_type: env_parse("RTP_PAYLOAD_TYPE", 111u8)?,
        rtp_max_late: env_parse("RTP_MAX_LATE", crate::core::rtp::DEFAULT_MAX_LATE)?,
        audio_codec: env_string("AUDIO_CODEC")
            .unwrap_or_else(|| crate::core::rtp::MIME_TYPE_OPUS.to_string()),
        audio_clock_rate: env_parse("AUDIO_CLOCK_RATE", 48000u32)?,
        audio_channels: env_parse("AUDIO_CHANNELS", 2u16)?,
        stt_provider,
        language_code: env_string("LANGUAGE_CODE").unwrap_or_else(|| "en-US".to_string()),
        interim_results: env_bool("INTERIM_RESULTS", true)?,
        hints: RecognitionHints::default(),
        google_speech_endpoint: env_string("GOOGLE_SPEECH_ENDPOINT")
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
        google_access_token: env_string("GOOGLE_ACCESS_TOKEN"),
        google_speech_model: env_string("GOOGLE_SPEECH_MODEL")
            .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        google_use_enhanced: env_bool("GOOGLE_USE_ENHANCED", true)?,
        google_connect_timeout_secs: env_parse("GOOGLE_CONNECT_TIMEOUT_SECS", 10u64)?,
    })
}
