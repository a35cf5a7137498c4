//! Encoder factory that records which frames each encoder generation saw.

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;

use waav_transcriber::core::bridge::BridgeSink;
use waav_transcriber::core::container::{ContainerEncoder, EncoderFactory};
use waav_transcriber::core::rtp::AudioFrame;
use waav_transcriber::core::stt::STTError;

/// Header written by every new encoder, followed by its generation number.
pub const GENERATION_MARKER: &[u8] = b"GEN";

/// Builds [`RecordingEncoder`]s. Generation `n` is the `n`-th encoder created.
#[derive(Default)]
pub struct RecordingFactory {
    generations: Arc<Mutex<Vec<Vec<u16>>>>,
}

impl RecordingFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn created(&self) -> usize {
        self.generations.lock().len()
    }

    /// Sequence numbers encoded by each generation.
    pub fn frames(&self) -> Vec<Vec<u16>> {
        self.generations.lock().clone()
    }
}

impl EncoderFactory for RecordingFactory {
    fn create(
        &self,
        _sample_rate: u32,
        _channels: u16,
        mut sink: BridgeSink,
    ) -> Result<Box<dyn ContainerEncoder>, STTError> {
        let generation = {
            let mut generations = self.generations.lock();
            generations.push(Vec::new());
            generations.len() - 1
        };
        sink.write_all(GENERATION_MARKER)
            .and_then(|()| sink.write_all(&[generation as u8]))
            .map_err(|e| STTError::EncodingError(e.to_string()))?;
        Ok(Box::new(RecordingEncoder {
            generation,
            generations: self.generations.clone(),
            sink,
        }))
    }
}

pub struct RecordingEncoder {
    generation: usize,
    generations: Arc<Mutex<Vec<Vec<u16>>>>,
    sink: BridgeSink,
}

impl ContainerEncoder for RecordingEncoder {
    fn write_frame(&mut self, frame: &AudioFrame) -> Result<(), STTError> {
        self.generations.lock()[self.generation].push(frame.sequence_number);
        self.sink
            .write_all(&frame.payload)
            .map_err(|e| STTError::EncodingError(e.to_string()))
    }
}
