//! Container encoders serializing reassembled frames for the recognition
//! service.

pub mod ogg_opus;

pub use ogg_opus::{DEFAULT_PRE_SKIP, OggOpusWriter};

use crate::core::bridge::BridgeSink;
use crate::core::rtp::AudioFrame;
use crate::core::stt::STTError;

/// Serializes frames into a byte sink. One instance per recognition session.
pub trait ContainerEncoder: Send {
    fn write_frame(&mut self, frame: &AudioFrame) -> Result<(), STTError>;
}

/// Builds a fresh encoder bound to the bridge for each recognition session.
pub trait EncoderFactory: Send + Sync {
    fn create(
        &self,
        sample_rate: u32,
        channels: u16,
        sink: BridgeSink,
    ) -> Result<Box<dyn ContainerEncoder>, STTError>;
}

/// Factory for [`OggOpusWriter`] encoders.
#[derive(Debug, Clone, Copy, Default)]
pub struct OggOpusFactory;

impl EncoderFactory for OggOpusFactory {
    fn create(
        &self,
        sample_rate: u32,
        channels: u16,
        sink: BridgeSink,
    ) -> Result<Box<dyn ContainerEncoder>, STTError> {
        Ok(Box::new(OggOpusWriter::new(sample_rate, channels, sink)?))
    }
}
