//! Google Cloud Speech-to-Text v1 Provider
//!
//! Streaming recognition over the v1 `StreamingRecognize` gRPC call, with Ogg/Opus
//! input, speech adaptation (boosted phrase set plus custom classes) and
//! interim results.
//!
//! ## Session limits
//!
//! The service closes a stream with `OUT_OF_RANGE` once it reaches its maximum
//! duration. This is surfaced as [`ReceiveError::MaxDurationExceeded`] so the
//! transcriber can rotate to a fresh session.
//!
//! ## Authentication
//!
//! An OAuth2 access token (`GOOGLE_ACCESS_TOKEN`) is sent as a bearer token on
//! every call. Plain `http://` endpoints (emulators, local proxies) may omit it.
//!
//! [`ReceiveError::MaxDurationExceeded`]: crate::core::stt::ReceiveError::MaxDurationExceeded

mod client;
mod config;
mod grpc;
mod messages;

pub use client::GoogleSpeechService;
pub use config::{DEFAULT_ENDPOINT, DEFAULT_MODEL, GoogleSpeechConfig};
pub use grpc::{
    AuthInterceptor, create_speech_channel, grpc_status_to_receive_error,
    grpc_status_to_stt_error,
};
pub use messages::{audio_request, config_request, response_batch};
