//! Transcription error types.

use thiserror::Error;

/// Result type for transcription operations.
pub type TranscribeResult<T> = Result<T, TranscribeError>;

/// Errors that can occur while transcribing.
#[derive(Debug, Error)]
pub enum TranscribeError {
    /// The backend rejected the request or reported a failed transcript.
    #[error("{message}")]
    Backend { status: Option<u16>, message: String },

    #[error("Transcription not finished after {polls} polls")]
    Timeout { polls: u32 },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TranscribeError {
    pub fn backend(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Backend {
            status,
            message: message.into(),
        }
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Transport failures, timeouts, throttling and 5xx are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout { .. } => true,
            Self::Backend {
                status: Some(code), ..
            } => *code == 429 || *code == 408 || *code >= 500,
            _ => false,
        }
    }

    /// Message reported by the backend, verbatim.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Backend { message, .. } => Some(message),
            _ => None,
        }
    }
}
