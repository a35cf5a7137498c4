//! Merging YAML overrides onto the environment configuration.

use super::ServerConfig;
use super::env::{load_from_env, parse_listen_addr};
use super::yaml::YamlConfig;
use crate::core::stt::STTProvider;

/// Load the environment configuration and apply YAML overrides on top.
pub(crate) fn merge_config(
    yaml: Option<YamlConfig>,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let mut config = load_from_env()?;

    let Some(yaml) = yaml else {
        return Ok(config);
    };

    if let Some(rtp) = yaml.rtp {
        if let Some(addr) = rtp.listen_addr {
            config.rtp_listen_addr = parse_listen_addr(&addr)?;
        }
        if let Some(pt) = rtp.payload_type {
            config.rtp_payload_type = pt;
        }
        if let Some(max_late) = rtp.max_late {
            config.rtp_max_late = max_late;
        }
    }

    if let Some(audio) = yaml.audio {
        if let Some(codec) = audio.codec {
            config.audio_codec = codec;
        }
        if let Some(clock_rate) = audio.clock_rate {
            config.audio_clock_rate = clock_rate;
        }
        if let Some(channels) = audio.channels {
            config.audio_channels = channels;
        }
    }

    if let Some(recognition) = yaml.recognition {
        if let Some(provider) = recognition.provider {
            config.stt_provider = provider.parse::<STTProvider>()?;
        }
        if let Some(language) = recognition.language_code {
            config.language_code = language;
        }
        if let Some(interim) = recognition.interim_results {
            config.interim_results = interim;
        }
        if let Some(hints) = recognition.hints {
            config.hints = hints;
        }
    }

    if let Some(google) = yaml.google {
        if let Some(endpoint) = google.endpoint {
            config.google_speech_endpoint = endpoint;
        }
        if let Some(token) = google.access_token {
            config.google_access_token = Some(token);
        }
        if let Some(model) = google.model {
            config.google_speech_model = model;
        }
        if let Some(enhanced) = google.use_enhanced {
            config.google_use_enhanced = enhanced;
        }
        if let Some(timeout) = google.connect_timeout_secs {
            config.google_connect_timeout_secs = timeout;
        }
    }

    Ok(config)
}
