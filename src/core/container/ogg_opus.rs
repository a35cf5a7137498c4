//! Ogg/Opus container writer (RFC 7845).

use std::io::Write;

use ogg::writing::{PacketWriteEndInfo, PacketWriter};

use super::ContainerEncoder;
use crate::core::rtp::AudioFrame;
use crate::core::stt::STTError;

/// Pre-skip written into the identification header, in 48 kHz samples.
pub const DEFAULT_PRE_SKIP: u16 = 3840;

const VENDOR: &str = "waav-transcriber";

// Sentinel meaning "no frame written yet" for both timestamp and granule.
const UNSET: u64 = 1;

/// Writes one logical Ogg/Opus stream into a byte sink.
///
/// The identification and comment headers are written on construction, so a
/// fresh writer always starts a self-contained stream. Each frame goes on its
/// own page with the granule position advanced by the RTP timestamp delta.
pub struct OggOpusWriter<W: Write> {
    writer: PacketWriter<'static, W>,
    serial: u32,
    previous_granule: u64,
    previous_timestamp: u64,
}

impl<W: Write> OggOpusWriter<W> {
    pub fn new(sample_rate: u32, channels: u16, sink: W) -> Result<Self, STTError> {
        let channels = u8::try_from(channels).map_err(|_| {
            STTError::ConfigurationError(format!("channel count {channels} out of range"))
        })?;

        let mut this = Self {
            writer: PacketWriter::new(sink),
            serial: uuid::Uuid::new_v4().as_u128() as u32,
            previous_granule: UNSET,
            previous_timestamp: UNSET,
        };
        this.write_page(opus_head(sample_rate, channels), 0)?;
        this.write_page(opus_tags(), 0)?;
        Ok(this)
    }

    pub fn serial(&self) -> u32 {
        self.serial
    }

    pub fn granule_position(&self) -> u64 {
        self.previous_granule
    }

    fn write_page(&mut self, packet: Vec<u8>, granule: u64) -> Result<(), STTError> {
        self.writer
            .write_packet(packet, self.serial, PacketWriteEndInfo::EndPage, granule)
            .map_err(|e| STTError::EncodingError(format!("failed to write ogg page: {e}")))
    }

    pub fn write_frame(&mut self, frame: &AudioFrame) -> Result<(), STTError> {
        if frame.payload.is_empty() {
            return Ok(());
        }

        let timestamp = frame.timestamp as u64;
        if self.previous_timestamp != UNSET {
            let increment = (frame.timestamp.wrapping_sub(self.previous_timestamp as u32)) as u64;
            self.previous_granule += increment;
        }
        self.previous_timestamp = timestamp;

        self.write_page(frame.payload.to_vec(), self.previous_granule)
    }
}

impl<W: Write + Send> ContainerEncoder for OggOpusWriter<W> {
    fn write_frame(&mut self, frame: &AudioFrame) -> Result<(), STTError> {
        OggOpusWriter::write_frame(self, frame)
    }
}

fn opus_head(sample_rate: u32, channels: u8) -> Vec<u8> {
    let mut head = Vec::with_capacity(19);
    head.extend_from_slice(b"OpusHead");
    head.push(1); // version
    head.push(channels);
    head.extend_from_slice(&DEFAULT_PRE_SKIP.to_le_bytes());
    head.extend_from_slice(&sample_rate.to_le_bytes());
    head.extend_from_slice(&0u16.to_le_bytes()); // output gain
    head.push(0); // channel mapping family
    head
}

fn opus_tags() -> Vec<u8> {
    let mut tags = Vec::with_capacity(8 + 4 + VENDOR.len() + 4);
    tags.extend_from_slice(b"OpusTags");
    tags.extend_from_slice(&(VENDOR.len() as u32).to_le_bytes());
    tags.extend_from_slice(VENDOR.as_bytes());
    tags.extend_from_slice(&0u32.to_le_bytes());
    tags
}
