//! OpenAI Whisper backend (single synchronous call).

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, info_span, Instrument};

use reelcut_models::TranscriptSegment;

use crate::config::TranscriberConfig;
use crate::error::{TranscribeError, TranscribeResult};
use crate::http::{backend_error, build_client, file_body, finish_segments};
use crate::{Transcriber, TranscriptionRequest};

const FALLBACK_ERROR: &str = "transcribe failed";

#[derive(Debug, Deserialize)]
struct VerboseTranscription {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    segments: Vec<WhisperSegment>,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    start: f64,
    end: f64,
    text: String,
}

/// Whisper transcription over `/v1/audio/transcriptions`.
pub struct OpenAiTranscriber {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiTranscriber {
    pub fn new(config: TranscriberConfig) -> TranscribeResult<Self> {
        Ok(Self {
            http: build_client(&config)?,
            api_key: config.api_key,
            base_url: config.base_url,
            model: config.model,
        })
    }

    async fn call(&self, request: &TranscriptionRequest) -> TranscribeResult<VerboseTranscription> {
        let (body, len) = file_body(&request.path).await?;
        let file_name = request
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.mp4".to_string());

        let form = Form::new()
            .part("file", Part::stream_with_length(body, len).file_name(file_name))
            .text("model", self.model.clone())
            .text("response_format", "verbose_json");

        let response = self
            .http
            .post(format!("{}/v1/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(backend_error(response, FALLBACK_ERROR).await);
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            TranscribeError::invalid_response(format!("Failed to parse Whisper response: {}", e))
        })
    }
}

#[async_trait]
impl Transcriber for OpenAiTranscriber {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn transcribe(
        &self,
        request: &TranscriptionRequest,
    ) -> TranscribeResult<Vec<TranscriptSegment>> {
        let span = info_span!("transcribe", backend = "openai", path = %request.path.display());

        async {
            let result = self.call(request).await?;
            debug!(segments = result.segments.len(), "Whisper response received");

            let segments = result
                .segments
                .into_iter()
                .map(|s| TranscriptSegment::new(s.start, s.end, s.text.trim()))
                .collect();
            let segments = finish_segments(segments, result.text.as_deref(), request.duration);

            info!(segments = segments.len(), "Transcription complete");
            Ok(segments)
        }
        .instrument(span)
        .await
    }
}
