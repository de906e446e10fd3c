//! Worker error types.

use thiserror::Error;

use reelcut_firestore::FirestoreError;
use reelcut_media::MediaError;
use reelcut_storage::StorageError;
use reelcut_transcribe::TranscribeError;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Invalid media: {0}")]
    InvalidMedia(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Job timed out after {0} seconds")]
    JobTimeout(u64),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Transcription error: {0}")]
    Transcribe(#[from] TranscribeError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Firestore error: {0}")]
    Firestore(#[from] FirestoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn project_not_found(id: impl Into<String>) -> Self {
        Self::ProjectNotFound(id.into())
    }

    pub fn invalid_media(msg: impl Into<String>) -> Self {
        Self::InvalidMedia(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Worth retrying on the spot, within the same job run.
    ///
    /// Covers transport-level failures only; slow backends (poll budget,
    /// ffmpeg timeouts) are left to the requeue path.
    pub fn is_transient(&self) -> bool {
        match self {
            WorkerError::Storage(e) => e.is_retryable(),
            WorkerError::Firestore(e) => e.is_retryable(),
            WorkerError::Transcribe(TranscribeError::Timeout { .. }) => false,
            WorkerError::Transcribe(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Worth requeueing the job for another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            WorkerError::JobTimeout(_) => true,
            WorkerError::Media(MediaError::Timeout(_)) => true,
            WorkerError::Transcribe(e) => e.is_retryable(),
            _ => self.is_transient(),
        }
    }

    /// Message stored on the job for the user.
    ///
    /// Transcription backend messages pass through verbatim; everything
    /// else is reduced to a short category without internals.
    pub fn user_message(&self) -> String {
        match self {
            WorkerError::Transcribe(e) => match e.backend_message() {
                Some(message) => message.to_string(),
                None => match e {
                    TranscribeError::Timeout { .. } => "Transcription timed out".to_string(),
                    _ => "Transcription failed".to_string(),
                },
            },
            WorkerError::ProjectNotFound(_) => "Project not found".to_string(),
            WorkerError::InvalidMedia(_) => "Source video could not be read".to_string(),
            WorkerError::InvalidInput(msg) => msg.clone(),
            WorkerError::JobTimeout(_) => "Processing timed out".to_string(),
            WorkerError::ConfigError(_) => "Worker is misconfigured".to_string(),
            WorkerError::Media(e) if e.is_probe_error() => {
                "Source video could not be read".to_string()
            }
            WorkerError::Media(_) => "Rendering failed".to_string(),
            WorkerError::Storage(StorageError::NotFound(_)) => "Source video not found".to_string(),
            WorkerError::Storage(_) => "Storage operation failed".to_string(),
            WorkerError::Firestore(_) => "Database operation failed".to_string(),
            WorkerError::Io(_) => "Local file operation failed".to_string(),
        }
    }
}
