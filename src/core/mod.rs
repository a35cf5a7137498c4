pub mod bridge;
pub mod container;
pub mod rtp;
pub mod stt;
pub mod transcriber;

// Re-export commonly used types for convenience
pub use bridge::{BridgeReader, BridgeSink, BridgeWriter, bridge};
pub use container::{ContainerEncoder, EncoderFactory, OggOpusFactory, OggOpusWriter};
pub use rtp::{AudioFrame, FrameReassembler, RtpCodecParameters, RtpPacket, SampleBuilder};
pub use stt::{
    GoogleSpeechConfig, GoogleSpeechService, RecognitionHints, RecognitionResult,
    RecognitionService, STTError, STTProvider, STTResult, Transcript, create_recognition_service,
    get_supported_stt_providers,
};
pub use transcriber::{StatsSnapshot, Transcriber, TranscriberConfig};
