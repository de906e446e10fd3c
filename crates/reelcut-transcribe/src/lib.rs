//! Speech-to-text clients.
//!
//! Two backends sit behind the [`Transcriber`] trait:
//! - AssemblyAI: upload, submit, then poll until the transcript settles
//! - OpenAI Whisper: a single multipart request
//!
//! Neither retries internally; callers decide using
//! [`TranscribeError::is_retryable`].

pub mod assemblyai;
pub mod config;
pub mod error;
mod http;
pub mod openai;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use reelcut_models::TranscriptSegment;

pub use assemblyai::AssemblyAiTranscriber;
pub use config::{Provider, TranscriberConfig};
pub use error::{TranscribeError, TranscribeResult};
pub use openai::OpenAiTranscriber;

/// Input to a transcription run.
#[derive(Debug, Clone)]
pub struct TranscriptionRequest {
    /// Local media file (audio or video)
    pub path: PathBuf,
    /// Media duration in seconds; bounds the fallback segment
    pub duration: f64,
}

impl TranscriptionRequest {
    pub fn new(path: impl Into<PathBuf>, duration: f64) -> Self {
        Self {
            path: path.into(),
            duration,
        }
    }
}

/// A speech-to-text backend.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &'static str;

    /// Transcribe the whole file into segments sorted by start time.
    async fn transcribe(
        &self,
        request: &TranscriptionRequest,
    ) -> TranscribeResult<Vec<TranscriptSegment>>;
}

/// Build the backend selected by `config.provider`.
pub fn build_transcriber(config: TranscriberConfig) -> TranscribeResult<Arc<dyn Transcriber>> {
    if config.api_key.is_empty() {
        return Err(TranscribeError::config(format!(
            "API key for provider {} is empty",
            config.provider
        )));
    }

    Ok(match config.provider {
        Provider::OpenAi => Arc::new(OpenAiTranscriber::new(config)?),
        Provider::AssemblyAi => Arc::new(AssemblyAiTranscriber::new(config)?),
    })
}
