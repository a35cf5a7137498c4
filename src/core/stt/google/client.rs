//! Google Speech v1 recognition service.
//!
//! Each session is one `StreamingRecognize` call:
//!
//! ```text
//! send_config/send_content → mpsc → request stream → gRPC → response stream → receive
//! ```
//!
//! The call is started lazily by the first `receive`, so the configuration
//! message is already queued when the request stream is first polled.

use async_trait::async_trait;
use bytes::Bytes;
use futures::future::BoxFuture;
use google_api_proto::google::cloud::speech::v1::{
    StreamingRecognizeRequest, StreamingRecognizeResponse, speech_client::SpeechClient,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tonic::transport::Channel;
use tonic::{Response, Status, Streaming};
use tracing::debug;

use super::config::GoogleSpeechConfig;
use super::grpc::{AuthInterceptor, create_speech_channel, grpc_status_to_receive_error};
use super::messages::{audio_request, config_request, response_batch};
use crate::core::stt::base::{
    ReceiveError, RecognitionService, RecognitionSession, ResponseBatch, STTError,
    SessionReceiver, SessionSender, StreamingSettings,
};

type CallFuture =
    BoxFuture<'static, Result<Response<Streaming<StreamingRecognizeResponse>>, Status>>;

/// Google Cloud Speech-to-Text v1 streaming recognition.
#[derive(Clone)]
pub struct GoogleSpeechService {
    channel: Channel,
    interceptor: AuthInterceptor,
    request_buffer: usize,
}

impl GoogleSpeechService {
    /// Validate the configuration and connect to the endpoint.
    pub async fn connect(config: &GoogleSpeechConfig) -> Result<Self, STTError> {
        config.validate().map_err(STTError::ConfigurationError)?;
        let channel = create_speech_channel(config).await?;
        Self::with_channel(channel, config)
    }

    /// Build the service over an existing channel.
    pub fn with_channel(channel: Channel, config: &GoogleSpeechConfig) -> Result<Self, STTError> {
        Ok(Self {
            channel,
            interceptor: AuthInterceptor::new(config.access_token.as_deref())?,
            request_buffer: config.request_buffer.max(1),
        })
    }
}

#[async_trait]
impl RecognitionService for GoogleSpeechService {
    async fn open(&self, cancel: CancellationToken) -> Result<RecognitionSession, STTError> {
        let (tx, mut rx) = mpsc::channel::<StreamingRecognizeRequest>(self.request_buffer);

        let requests = async_stream::stream! {
            while let Some(request) = rx.recv().await {
                yield request;
            }
            debug!("Speech request stream finished");
        };

        let mut client = SpeechClient::with_interceptor(self.channel.clone(), self.interceptor.clone());
        let call: CallFuture = Box::pin(async move { client.streaming_recognize(requests).await });

        Ok(RecognitionSession::new(
            Box::new(GoogleSessionSender { tx }),
            Box::new(GoogleSessionReceiver {
                state: ResponseState::Pending(call),
                cancel,
            }),
        ))
    }

    fn get_provider_info(&self) -> &'static str {
        "Google Cloud Speech-to-Text v1"
    }
}

struct GoogleSessionSender {
    tx: mpsc::Sender<StreamingRecognizeRequest>,
}

impl GoogleSessionSender {
    async fn send(&self, request: StreamingRecognizeRequest) -> Result<(), STTError> {
        self.tx
            .send(request)
            .await
            .map_err(|_| STTError::ConnectionFailed("Speech request stream closed".to_string()))
    }
}

#[async_trait]
impl SessionSender for GoogleSessionSender {
    async fn send_config(&mut self, settings: &StreamingSettings) -> Result<(), STTError> {
        self.send(config_request(settings)).await
    }

    async fn send_content(&mut self, content: Bytes) -> Result<(), STTError> {
        self.send(audio_request(content)).await
    }
}

enum ResponseState {
    Pending(CallFuture),
    Streaming(Streaming<StreamingRecognizeResponse>),
    Ended,
}

struct GoogleSessionReceiver {
    state: ResponseState,
    cancel: CancellationToken,
}

impl GoogleSessionReceiver {
    async fn next_batch(&mut self) -> Result<ResponseBatch, ReceiveError> {
        loop {
            match &mut self.state {
                ResponseState::Pending(call) => {
                    let started = call.as_mut().await;
                    match started {
                        Ok(response) => {
                            debug!("Speech streaming call established");
                            self.state = ResponseState::Streaming(response.into_inner());
                        }
                        Err(status) => {
                            self.state = ResponseState::Ended;
                            return Err(grpc_status_to_receive_error(status));
                        }
                    }
                }
                ResponseState::Streaming(stream) => {
                    let message = stream.message().await;
                    return match message {
                        Ok(Some(response)) => Ok(response_batch(response)),
                        Ok(None) => {
                            self.state = ResponseState::Ended;
                            Err(ReceiveError::Failed(STTError::ProviderError(
                                "Speech response stream ended".to_string(),
                            )))
                        }
                        Err(status) => {
                            self.state = ResponseState::Ended;
                            Err(grpc_status_to_receive_error(status))
                        }
                    };
                }
                ResponseState::Ended => {
                    return Err(ReceiveError::Failed(STTError::ProviderError(
                        "Speech response stream already ended".to_string(),
                    )));
                }
            }
        }
    }
}

#[async_trait]
impl SessionReceiver for GoogleSessionReceiver {
    async fn receive(&mut self) -> Result<ResponseBatch, ReceiveError> {
        let cancel = self.cancel.clone();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ReceiveError::Canceled),
            batch = self.next_batch() => batch,
        }
    }
}
