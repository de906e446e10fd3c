//! AssemblyAI backend: upload, submit, poll.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn, Instrument};

use reelcut_models::TranscriptSegment;

use crate::config::TranscriberConfig;
use crate::error::{TranscribeError, TranscribeResult};
use crate::http::{backend_error, build_client, file_body, finish_segments};
use crate::{Transcriber, TranscriptionRequest};

#[derive(Debug, Deserialize)]
struct UploadResponse {
    upload_url: String,
}

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    audio_url: &'a str,
    punctuate: bool,
    format_text: bool,
}

#[derive(Debug, Deserialize)]
struct TranscriptResponse {
    id: String,
    status: TranscriptStatus,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    words: Option<Vec<Word>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum TranscriptStatus {
    Queued,
    Processing,
    Completed,
    Error,
}

/// Word timing in milliseconds.
#[derive(Debug, Deserialize)]
struct Word {
    start: u64,
    end: u64,
    text: String,
}

/// AssemblyAI transcription with bounded status polling.
pub struct AssemblyAiTranscriber {
    http: Client,
    api_key: String,
    base_url: String,
    poll_interval: Duration,
    max_polls: u32,
}

impl AssemblyAiTranscriber {
    pub fn new(config: TranscriberConfig) -> TranscribeResult<Self> {
        Ok(Self {
            http: build_client(&config)?,
            api_key: config.api_key,
            base_url: config.base_url,
            poll_interval: config.poll_interval,
            max_polls: config.max_polls,
        })
    }

    async fn upload(&self, request: &TranscriptionRequest) -> TranscribeResult<String> {
        let (body, len) = file_body(&request.path).await?;

        let response = self
            .http
            .post(format!("{}/v2/upload", self.base_url))
            .header("authorization", &self.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(backend_error(response, "upload failed").await);
        }

        let upload: UploadResponse = parse(response).await?;
        debug!(bytes = len, "Uploaded media");
        Ok(upload.upload_url)
    }

    async fn submit(&self, audio_url: &str) -> TranscribeResult<String> {
        let response = self
            .http
            .post(format!("{}/v2/transcript", self.base_url))
            .header("authorization", &self.api_key)
            .json(&SubmitRequest {
                audio_url,
                punctuate: true,
                format_text: true,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(backend_error(response, "transcript request failed").await);
        }

        let transcript: TranscriptResponse = parse(response).await?;
        Ok(transcript.id)
    }

    async fn fetch(&self, id: &str) -> TranscribeResult<TranscriptResponse> {
        let response = self
            .http
            .get(format!("{}/v2/transcript/{}", self.base_url, id))
            .header("authorization", &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(backend_error(response, "transcript status failed").await);
        }
        parse(response).await
    }

    /// Poll until the transcript completes, fails, or the poll budget runs out.
    async fn wait(&self, id: &str) -> TranscribeResult<TranscriptResponse> {
        for poll in 1..=self.max_polls {
            let transcript = self.fetch(id).await?;
            match transcript.status {
                TranscriptStatus::Completed => {
                    debug!(polls = poll, "Transcript completed");
                    return Ok(transcript);
                }
                TranscriptStatus::Error => {
                    let message = transcript
                        .error
                        .unwrap_or_else(|| "transcription failed".to_string());
                    warn!(transcript_id = %id, "Transcript failed: {}", message);
                    return Err(TranscribeError::backend(None, message));
                }
                TranscriptStatus::Queued | TranscriptStatus::Processing => {
                    if poll < self.max_polls {
                        tokio::time::sleep(self.poll_interval).await;
                    }
                }
            }
        }

        Err(TranscribeError::Timeout {
            polls: self.max_polls,
        })
    }
}

async fn parse<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> TranscribeResult<T> {
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| {
        TranscribeError::invalid_response(format!("Failed to parse AssemblyAI response: {}", e))
    })
}

#[async_trait]
impl Transcriber for AssemblyAiTranscriber {
    fn name(&self) -> &'static str {
        "assemblyai"
    }

    async fn transcribe(
        &self,
        request: &TranscriptionRequest,
    ) -> TranscribeResult<Vec<TranscriptSegment>> {
        let span = info_span!("transcribe", backend = "assemblyai", path = %request.path.display());

        async {
            let audio_url = self.upload(request).await?;
            let id = self.submit(&audio_url).await?;
            info!(transcript_id = %id, "Transcript submitted");

            let transcript = self.wait(&id).await?;
            let segments = transcript
                .words
                .unwrap_or_default()
                .into_iter()
                .map(|w| TranscriptSegment::new(w.start as f64 / 1000.0, w.end as f64 / 1000.0, w.text))
                .collect();
            let segments = finish_segments(segments, transcript.text.as_deref(), request.duration);

            info!(segments = segments.len(), "Transcription complete");
            Ok(segments)
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Provider;
    use serde_json::json;
    use std::io::Write;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn media_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"fake audio bytes").unwrap();
        file
    }

    fn transcriber(server: &MockServer, max_polls: u32) -> AssemblyAiTranscriber {
        AssemblyAiTranscriber::new(
            TranscriberConfig::new(Provider::AssemblyAi, "aai-key")
                .with_base_url(server.uri())
                .with_polling(Duration::from_millis(1), max_polls),
        )
        .unwrap()
    }

    async fn mount_upload_and_submit(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/v2/upload"))
            .and(header("authorization", "aai-key"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"upload_url": "https://cdn.example/upload/abc"})),
            )
            .expect(1)
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v2/transcript"))
            .and(body_partial_json(json!({
                "audio_url": "https://cdn.example/upload/abc",
                "punctuate": true,
                "format_text": true
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": "tr-1", "status": "queued"})),
            )
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_polls_until_completed_and_converts_words() {
        let server = MockServer::start().await;
        mount_upload_and_submit(&server).await;
        Mock::given(method("GET"))
            .and(path("/v2/transcript/tr-1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": "tr-1", "status": "processing"})),
            )
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/transcript/tr-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "tr-1",
                "status": "completed",
                "text": "Hello world.",
                "words": [
                    {"start": 250, "end": 900, "text": "Hello", "confidence": 0.98},
                    {"start": 1000, "end": 1480, "text": "world.", "confidence": 0.97}
                ]
            })))
            .mount(&server)
            .await;

        let file = media_file();
        let segments = transcriber(&server, 10)
            .transcribe(&TranscriptionRequest::new(file.path(), 2.0))
            .await
            .unwrap();

        assert_eq!(
            segments,
            vec![
                TranscriptSegment::new(0.25, 0.9, "Hello"),
                TranscriptSegment::new(1.0, 1.48, "world."),
            ]
        );
    }

    #[tokio::test]
    async fn test_error_status_carries_backend_message() {
        let server = MockServer::start().await;
        mount_upload_and_submit(&server).await;
        Mock::given(method("GET"))
            .and(path("/v2/transcript/tr-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "tr-1",
                "status": "error",
                "error": "Audio duration is too short."
            })))
            .mount(&server)
            .await;

        let file = media_file();
        let err = transcriber(&server, 10)
            .transcribe(&TranscriptionRequest::new(file.path(), 2.0))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Audio duration is too short.");
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_poll_budget_exhaustion_is_timeout() {
        let server = MockServer::start().await;
        mount_upload_and_submit(&server).await;
        Mock::given(method("GET"))
            .and(path("/v2/transcript/tr-1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": "tr-1", "status": "processing"})),
            )
            .expect(3)
            .mount(&server)
            .await;

        let file = media_file();
        let err = transcriber(&server, 3)
            .transcribe(&TranscriptionRequest::new(file.path(), 2.0))
            .await
            .unwrap_err();

        assert!(matches!(err, TranscribeError::Timeout { polls: 3 }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_completed_without_words_falls_back() {
        let server = MockServer::start().await;
        mount_upload_and_submit(&server).await;
        Mock::given(method("GET"))
            .and(path("/v2/transcript/tr-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "tr-1",
                "status": "completed",
                "text": "music",
                "words": []
            })))
            .mount(&server)
            .await;

        let file = media_file();
        let segments = transcriber(&server, 10)
            .transcribe(&TranscriptionRequest::new(file.path(), 61.0))
            .await
            .unwrap();

        assert_eq!(segments, vec![TranscriptSegment::new(0.0, 61.0, "music")]);
    }

    #[tokio::test]
    async fn test_rejected_upload_is_backend_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/upload"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({"error": "Authentication error, API token missing/invalid"})),
            )
            .mount(&server)
            .await;

        let file = media_file();
        let err = transcriber(&server, 10)
            .transcribe(&TranscriptionRequest::new(file.path(), 2.0))
            .await
            .unwrap_err();

        assert!(matches!(err, TranscribeError::Backend { status: Some(401), .. }));
        assert_eq!(err.to_string(), "Authentication error, API token missing/invalid");
    }
}
