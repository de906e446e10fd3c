//! Storage error types.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to configure storage client: {0}")]
    ConfigError(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {message}")]
    DownloadFailed {
        message: String,
        /// HTTP status, when the server answered
        status: Option<u16>,
    },

    #[error("Presign failed: {0}")]
    PresignFailed(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("AWS SDK error: {0}")]
    AwsSdk(String),
}

impl StorageError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound(key.into())
    }

    pub fn upload_failed(msg: impl Into<String>) -> Self {
        Self::UploadFailed(msg.into())
    }

    pub fn download_failed(msg: impl Into<String>, status: Option<u16>) -> Self {
        Self::DownloadFailed {
            message: msg.into(),
            status,
        }
    }

    pub fn invalid_key(key: impl Into<String>) -> Self {
        Self::InvalidKey(key.into())
    }

    /// Whether retrying the same call could succeed.
    ///
    /// Transport failures, 5xx, 408 and 429 are transient; missing objects,
    /// bad keys, configuration and other 4xx answers are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::UploadFailed(_) | Self::AwsSdk(_) | Self::Io(_) => true,
            Self::DownloadFailed { status, .. } => match status {
                None => true,
                Some(code) => *code >= 500 || *code == 408 || *code == 429,
            },
            Self::ConfigError(_)
            | Self::NotFound(_)
            | Self::PresignFailed(_)
            | Self::InvalidKey(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(StorageError::upload_failed("reset").is_retryable());
        assert!(StorageError::download_failed("timeout", None).is_retryable());
        assert!(StorageError::download_failed("busy", Some(503)).is_retryable());
        assert!(StorageError::download_failed("slow down", Some(429)).is_retryable());
        assert!(!StorageError::download_failed("forbidden", Some(403)).is_retryable());
        assert!(!StorageError::not_found("videos/p1.mp4").is_retryable());
        assert!(!StorageError::config_error("R2_ENDPOINT_URL not set").is_retryable());
    }
}
