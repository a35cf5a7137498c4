//! Packet ingestion: reassembler, per-session encoder and bridge writer behind
//! one lock.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error};

use crate::core::bridge::BridgeWriter;
use crate::core::container::{ContainerEncoder, EncoderFactory};
use crate::core::rtp::{FrameReassembler, RtpPacket};
use crate::core::stt::STTError;

struct IngestState {
    reassembler: Box<dyn FrameReassembler>,
    // None until the first packet after (re)start of a session
    encoder: Option<Box<dyn ContainerEncoder>>,
    writer: BridgeWriter,
}

pub(crate) struct Ingest {
    state: Mutex<IngestState>,
    factory: Arc<dyn EncoderFactory>,
    sample_rate: u32,
    channels: u16,
}

impl Ingest {
    pub(crate) fn new(
        reassembler: Box<dyn FrameReassembler>,
        factory: Arc<dyn EncoderFactory>,
        writer: BridgeWriter,
        sample_rate: u32,
        channels: u16,
    ) -> Self {
        Self {
            state: Mutex::new(IngestState {
                reassembler,
                encoder: None,
                writer,
            }),
            factory,
            sample_rate,
            channels,
        }
    }

    /// Push one packet and encode every frame it makes ready.
    ///
    /// Stops at the first encoding error; the remaining frames of this call
    /// are discarded.
    pub(crate) fn submit(&self, packet: RtpPacket) -> Result<(), STTError> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        if state.writer.is_closed() {
            return Err(STTError::AudioProcessingError(
                "transcriber is stopped".to_string(),
            ));
        }

        let encoder = match state.encoder.take() {
            Some(encoder) => encoder,
            None => {
                let encoder = self
                    .factory
                    .create(self.sample_rate, self.channels, state.writer.sink())
                    .inspect_err(|e| error!(error = %e, "Failed to create container encoder"))?;
                debug!("Created container encoder for new session");
                encoder
            }
        };
        let encoder = state.encoder.insert(encoder);

        state.reassembler.push(packet);
        for frame in state.reassembler.pop_ready() {
            encoder.write_frame(&frame)?;
        }
        Ok(())
    }

    /// Retire the current container. Drops the encoder and discards its bytes
    /// still sitting in the bridge, so the next packet starts a fresh container
    /// at the head of the stream. Frames held by the reassembler are kept.
    pub(crate) fn reset_container(&self) {
        let mut state = self.state.lock();
        state.encoder = None;
        let dropped = state.writer.clear();
        if dropped > 0 {
            debug!(bytes = dropped, "Discarded unsent bytes of retired container");
        }
    }

    /// Close the bridge writer. Later submissions fail.
    pub(crate) fn close(&self) {
        let mut state = self.state.lock();
        state.encoder = None;
        state.writer.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bridge::{BridgeSink, bridge};
    use crate::core::container::OggOpusFactory;
    use crate::core::rtp::{AudioFrame, SampleBuilder};
    use ogg::reading::PacketReader;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingEncoder;

    impl ContainerEncoder for FailingEncoder {
        fn write_frame(&mut self, _frame: &AudioFrame) -> Result<(), STTError> {
            Err(STTError::EncodingError("boom".to_string()))
        }
    }

    #[derive(Default)]
    struct CountingFactory {
        created: AtomicUsize,
    }

    impl EncoderFactory for CountingFactory {
        fn create(
            &self,
            _sample_rate: u32,
            _channels: u16,
            _sink: BridgeSink,
        ) -> Result<Box<dyn ContainerEncoder>, STTError> {
            self.created.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FailingEncoder))
        }
    }

    fn packet(seq: u16) -> RtpPacket {
        RtpPacket::new(seq, seq as u32 * 960, vec![0xFC, seq as u8])
    }

    #[tokio::test]
    async fn test_submit_writes_container_bytes() {
        let (writer, mut reader) = bridge();
        let ingest = Ingest::new(
            Box::new(SampleBuilder::default()),
            Arc::new(OggOpusFactory),
            writer,
            48000,
            2,
        );
        ingest.submit(packet(1)).unwrap();
        let bytes = reader.read().await.unwrap();
        assert!(bytes.windows(8).any(|w| w == b"OpusHead"));
        assert!(bytes.ends_with(&[0xFC, 1]));
    }

    #[test]
    fn test_encoder_created_lazily_and_recreated_after_reset() {
        let (writer, _reader) = bridge();
        let factory = Arc::new(CountingFactory::default());
        let ingest = Ingest::new(
            Box::new(SampleBuilder::default()),
            factory.clone(),
            writer,
            48000,
            2,
        );
        assert_eq!(factory.created.load(Ordering::SeqCst), 0);

        assert!(matches!(
            ingest.submit(packet(1)),
            Err(STTError::EncodingError(_))
        ));
        // out-of-order packet: no ready frame, no encoder call
        assert!(ingest.submit(packet(5)).is_ok());
        assert_eq!(factory.created.load(Ordering::SeqCst), 1);

        ingest.reset_container();
        assert!(ingest.submit(packet(9)).is_ok());
        assert_eq!(factory.created.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_reset_starts_stream_with_fresh_container() {
        let (writer, mut reader) = bridge();
        let ingest = Ingest::new(
            Box::new(SampleBuilder::default()),
            Arc::new(OggOpusFactory),
            writer,
            48000,
            2,
        );
        ingest.submit(packet(1)).unwrap();
        ingest.submit(packet(2)).unwrap();

        // nothing was read before the reset
        ingest.reset_container();
        ingest.submit(packet(3)).unwrap();

        let bytes = reader.read().await.unwrap();
        assert!(bytes.starts_with(b"OggS"));
        assert_eq!(bytes.windows(8).position(|w| w == b"OpusHead"), Some(28));

        let mut packets = PacketReader::new(Cursor::new(bytes.to_vec()));
        let head = packets.read_packet().unwrap().unwrap();
        assert!(head.first_in_stream());
        assert_eq!(&head.data[..8], b"OpusHead");
        let tags = packets.read_packet().unwrap().unwrap();
        assert_eq!(&tags.data[..8], b"OpusTags");
        let audio = packets.read_packet().unwrap().unwrap();
        assert_eq!(audio.data, vec![0xFC, 3]);
        assert!(packets.read_packet().unwrap().is_none());
    }

    #[test]
    fn test_submit_after_close_fails() {
        let (writer, _reader) = bridge();
        let ingest = Ingest::new(
            Box::new(SampleBuilder::default()),
            Arc::new(OggOpusFactory),
            writer,
            48000,
            2,
        );
        ingest.close();
        ingest.close();
        assert!(matches!(
            ingest.submit(packet(1)),
            Err(STTError::AudioProcessingError(_))
        ));
    }
}
