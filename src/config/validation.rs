//! Configuration validation logic.

use super::ServerConfig;

/// Validate the inbound RTP and codec settings.
pub(crate) fn validate_audio(config: &ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.rtp_payload_type > 127 {
        return Err(format!(
            "RTP payload type must be in 0..=127, got {}",
            config.rtp_payload_type
        )
        .into());
    }

    if config.rtp_max_late == 0 {
        return Err("RTP_MAX_LATE must be greater than zero".into());
    }

    config
        .codec_parameters()
        .validate()
        .map_err(|e| format!("Invalid audio configuration: {e}"))?;

    Ok(())
}

/// Validate the recognition settings, including hints.
pub(crate) fn validate_recognition(
    config: &ServerConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    config
        .transcriber_config()
        .validate()
        .map_err(|e| format!("Invalid recognition configuration: {e}"))?;
    Ok(())
}

/// Validate provider credentials and endpoint.
pub(crate) fn validate_google(config: &ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    config.google_speech_config().validate()?;
    if config.google_speech_model.trim().is_empty() {
        return Err("GOOGLE_SPEECH_MODEL must not be empty".into());
    }
    Ok(())
}

/// Run all validators.
pub(crate) fn validate(config: &ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    validate_audio(config)?;
    validate_recognition(config)?;
    validate_google(config)?;
    Ok(())
}
