//! gRPC transport for the Speech v1 `StreamingRecognize` call.
//!
//! ```protobuf
//! service Speech {
//!     rpc StreamingRecognize(stream StreamingRecognizeRequest)
//!         returns (stream StreamingRecognizeResponse);
//! }
//! ```

use tonic::metadata::{Ascii, MetadataValue};
use tonic::service::Interceptor;
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};
use tonic::{Request, Status};
use tracing::info;

use super::config::GoogleSpeechConfig;
use crate::core::stt::base::{ReceiveError, STTError};

/// Create a gRPC channel to the configured Speech endpoint.
pub async fn create_speech_channel(config: &GoogleSpeechConfig) -> Result<Channel, STTError> {
    let mut endpoint = Endpoint::from_shared(config.endpoint.clone())
        .map_err(|e| STTError::ConfigurationError(format!("Invalid endpoint: {}", e)))?
        .connect_timeout(config.connect_timeout());

    if config.uses_tls() {
        let domain = endpoint
            .uri()
            .host()
            .ok_or_else(|| {
                STTError::ConfigurationError(format!("Endpoint has no host: {}", config.endpoint))
            })?
            .to_string();
        endpoint = endpoint
            .tls_config(ClientTlsConfig::new().domain_name(domain))
            .map_err(|e| STTError::ConfigurationError(format!("TLS config error: {}", e)))?;
    }

    let channel = endpoint
        .connect()
        .await
        .map_err(|e| STTError::ConnectionFailed(format!("gRPC connection failed: {}", e)))?;

    info!(endpoint = %config.endpoint, "Connected to Google Speech gRPC endpoint");
    Ok(channel)
}

/// Adds the bearer token to every outgoing request.
#[derive(Clone, Default)]
pub struct AuthInterceptor {
    authorization: Option<MetadataValue<Ascii>>,
}

impl AuthInterceptor {
    pub fn new(access_token: Option<&str>) -> Result<Self, STTError> {
        let authorization = match access_token {
            Some(token) if !token.is_empty() => Some(
                format!("Bearer {token}")
                    .parse::<MetadataValue<Ascii>>()
                    .map_err(|_| {
                        STTError::ConfigurationError(
                            "Invalid authorization header value".to_string(),
                        )
                    })?,
            ),
            _ => None,
        };
        Ok(Self { authorization })
    }
}

impl Interceptor for AuthInterceptor {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        if let Some(ref value) = self.authorization {
            request
                .metadata_mut()
                .insert("authorization", value.clone());
        }
        Ok(request)
    }
}

/// Classify a gRPC status ending a recognition session.
///
/// `OUT_OF_RANGE` is how the service signals that the maximum stream duration
/// was reached; `CANCELLED` follows local cancellation.
pub fn grpc_status_to_receive_error(status: Status) -> ReceiveError {
    match status.code() {
        tonic::Code::OutOfRange => ReceiveError::MaxDurationExceeded,
        tonic::Code::Cancelled => ReceiveError::Canceled,
        _ => ReceiveError::Failed(grpc_status_to_stt_error(status)),
    }
}

/// Convert gRPC status to STT error
pub fn grpc_status_to_stt_error(status: Status) -> STTError {
    let code = status.code();
    let message = status.message().to_string();

    match code {
        tonic::Code::Unauthenticated | tonic::Code::PermissionDenied => {
            STTError::AuthenticationFailed(format!("{:?}: {}", code, message))
        }
        tonic::Code::Unavailable => {
            STTError::ConnectionFailed(format!("Service unavailable: {}", message))
        }
        tonic::Code::InvalidArgument => {
            STTError::ConfigurationError(format!("Invalid argument: {}", message))
        }
        tonic::Code::DeadlineExceeded => {
            STTError::NetworkError(format!("Request timed out: {}", message))
        }
        _ => STTError::ProviderError(format!("gRPC error {:?}: {}", code, message)),
    }
}
