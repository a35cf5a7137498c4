//! Conversion between transcriber types and Speech v1 protobuf messages.

use bytes::Bytes;
use google_api_proto::google::cloud::speech::v1::{
    CustomClass, PhraseSet, RecognitionConfig, SpeechAdaptation, StreamingRecognitionConfig,
    StreamingRecognizeRequest, StreamingRecognizeResponse, custom_class::ClassItem,
    phrase_set::Phrase, recognition_config::AudioEncoding as ProtoEncoding,
    streaming_recognize_request::StreamingRequest,
};

use super::config::DEFAULT_MODEL;
use crate::core::stt::{
    AudioEncoding, RecognitionEntry, RecognitionHints, ResponseBatch, StreamingSettings,
};

fn proto_encoding(encoding: AudioEncoding) -> ProtoEncoding {
    match encoding {
        AudioEncoding::OggOpus => ProtoEncoding::OggOpus,
    }
}

fn speech_adaptation(hints: &RecognitionHints) -> Option<SpeechAdaptation> {
    if hints.is_empty() {
        return None;
    }

    let phrase_set = PhraseSet {
        phrases: hints
            .phrases
            .iter()
            .map(|value| Phrase {
                value: value.clone(),
                ..Default::default()
            })
            .collect(),
        boost: hints.boost,
        ..Default::default()
    };

    let custom_classes = hints
        .classes
        .iter()
        .map(|class| CustomClass {
            custom_class_id: class.class_id.clone(),
            items: class
                .items
                .iter()
                .map(|value| ClassItem {
                    value: value.clone(),
                })
                .collect(),
            ..Default::default()
        })
        .collect();

    Some(SpeechAdaptation {
        phrase_sets: vec![phrase_set],
        custom_classes,
        ..Default::default()
    })
}

/// First message of every session.
pub fn config_request(settings: &StreamingSettings) -> StreamingRecognizeRequest {
    let config = RecognitionConfig {
        encoding: proto_encoding(settings.encoding) as i32,
        sample_rate_hertz: settings.sample_rate_hertz as i32,
        audio_channel_count: settings.audio_channel_count as i32,
        language_code: settings.language_code.clone(),
        adaptation: speech_adaptation(&settings.hints),
        model: settings
            .model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        use_enhanced: settings.use_enhanced,
        ..Default::default()
    };

    StreamingRecognizeRequest {
        streaming_request: Some(StreamingRequest::StreamingConfig(
            StreamingRecognitionConfig {
                config: Some(config),
                interim_results: settings.interim_results,
                ..Default::default()
            },
        )),
    }
}

pub fn audio_request(content: Bytes) -> StreamingRecognizeRequest {
    StreamingRecognizeRequest {
        streaming_request: Some(StreamingRequest::AudioContent(content.to_vec().into())),
    }
}

/// Flatten a response into a batch of top-alternative transcripts.
pub fn response_batch(response: StreamingRecognizeResponse) -> ResponseBatch {
    if let Some(status) = response.error {
        return ResponseBatch::service_error(format!("code {}: {}", status.code, status.message));
    }

    let results = response
        .results
        .into_iter()
        .map(|result| RecognitionEntry {
            transcript: result
                .alternatives
                .into_iter()
                .next()
                .map(|alt| alt.transcript)
                .unwrap_or_default(),
            is_final: result.is_final,
        })
        .collect();

    ResponseBatch::new(results)
}
