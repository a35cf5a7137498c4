//! RTP ingestion primitives: packet parsing, codec parameters and reassembly.

pub mod packet;
pub mod sample_builder;

pub use packet::RtpPacket;
pub use sample_builder::{AudioFrame, DEFAULT_MAX_LATE, SampleBuilder};

use serde::{Deserialize, Serialize};

use crate::core::stt::STTError;

/// MIME type of the only codec the transcriber accepts.
pub const MIME_TYPE_OPUS: &str = "audio/opus";

/// Orders packets of one track and releases the frames that are ready.
pub trait FrameReassembler: Send {
    fn push(&mut self, packet: RtpPacket);

    /// Frames now ready for encoding, oldest first. May be empty.
    fn pop_ready(&mut self) -> Vec<AudioFrame>;
}

/// Codec descriptor of the inbound track, as negotiated by signaling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RtpCodecParameters {
    pub mime_type: String,
    pub clock_rate: u32,
    pub channels: u16,
    pub payload_type: u8,
}

impl RtpCodecParameters {
    /// Opus at 48 kHz stereo on the conventional dynamic payload type.
    pub fn opus() -> Self {
        Self {
            mime_type: MIME_TYPE_OPUS.to_string(),
            clock_rate: 48000,
            channels: 2,
            payload_type: 111,
        }
    }

    pub fn is_opus(&self) -> bool {
        self.mime_type.eq_ignore_ascii_case(MIME_TYPE_OPUS)
    }

    /// Reject anything but a usable Opus descriptor.
    pub fn validate(&self) -> Result<(), STTError> {
        if !self.is_opus() {
            return Err(STTError::ConfigurationError(format!(
                "unsupported codec {}, only {MIME_TYPE_OPUS} is supported",
                self.mime_type
            )));
        }
        if self.clock_rate == 0 {
            return Err(STTError::ConfigurationError(
                "clock rate must be greater than zero".to_string(),
            ));
        }
        if !(1..=2).contains(&self.channels) {
            return Err(STTError::ConfigurationError(format!(
                "unsupported channel count {}",
                self.channels
            )));
        }
        Ok(())
    }
}

impl Default for RtpCodecParameters {
    fn default() -> Self {
        Self::opus()
    }
}
