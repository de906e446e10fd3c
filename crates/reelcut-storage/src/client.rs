//! R2 client implementation.

use std::path::Path;
use std::time::Duration;

use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};
use crate::keys::ObjectPath;

/// Configuration for R2 client.
#[derive(Debug, Clone)]
pub struct R2Config {
    /// R2 endpoint URL (S3 API endpoint)
    pub endpoint_url: String,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Region (usually "auto" for R2)
    pub region: String,
}

impl R2Config {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self {
            endpoint_url: required_env("R2_ENDPOINT_URL")?,
            access_key_id: required_env("R2_ACCESS_KEY_ID")?,
            secret_access_key: required_env("R2_SECRET_ACCESS_KEY")?,
            region: std::env::var("R2_REGION").unwrap_or_else(|_| "auto".to_string()),
        })
    }
}

fn required_env(name: &str) -> StorageResult<String> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| StorageError::config_error(format!("{} not set", name)))
}

/// Cloudflare R2 storage client.
///
/// Buckets are passed per call: sources and rendered clips live in different
/// buckets under the same credentials.
#[derive(Clone)]
pub struct R2Client {
    client: Client,
}

impl R2Client {
    /// Create a new R2 client from configuration.
    pub fn new(config: R2Config) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "r2",
        );

        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(sdk_config),
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self::new(R2Config::from_env()?))
    }

    /// Upload a local file.
    pub async fn upload_file(
        &self,
        bucket: &str,
        key: &str,
        path: impl AsRef<Path>,
        content_type: &str,
    ) -> StorageResult<ObjectPath> {
        let path = path.as_ref();
        debug!("Uploading {} to {}/{}", path.display(), bucket, key);

        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::upload_failed(format!("{}: {}", path.display(), e)))?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        info!("Uploaded {} to {}/{}", path.display(), bucket, key);
        Ok(ObjectPath::new(bucket, key))
    }

    /// Generate a presigned GET URL.
    pub async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        let presign_config = PresigningConfig::expires_in(expires_in)
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        let presigned = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presign_config)
            .await
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        Ok(presigned.uri().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn set_r2_env() {
        std::env::set_var("R2_ENDPOINT_URL", "https://account.r2.cloudflarestorage.com");
        std::env::set_var("R2_ACCESS_KEY_ID", "key");
        std::env::set_var("R2_SECRET_ACCESS_KEY", "secret");
        std::env::remove_var("R2_REGION");
    }

    #[test]
    #[serial]
    fn test_config_from_env() {
        set_r2_env();
        let config = R2Config::from_env().unwrap();
        assert_eq!(config.region, "auto");
        assert_eq!(config.access_key_id, "key");
    }

    #[test]
    #[serial]
    fn test_config_requires_credentials() {
        set_r2_env();
        std::env::set_var("R2_SECRET_ACCESS_KEY", " ");
        let err = R2Config::from_env().unwrap_err();
        assert!(err.to_string().contains("R2_SECRET_ACCESS_KEY"));
    }

    #[tokio::test]
    async fn test_presign_is_local() {
        let client = R2Client::new(R2Config {
            endpoint_url: "https://account.r2.cloudflarestorage.com".into(),
            access_key_id: "key".into(),
            secret_access_key: "secret".into(),
            region: "auto".into(),
        });

        let url = client
            .presign_get("videos", "uploads/p1/source.mp4", Duration::from_secs(900))
            .await
            .unwrap();

        assert!(url.starts_with("https://account.r2.cloudflarestorage.com/videos/uploads/p1/source.mp4?"));
        assert!(url.contains("X-Amz-Expires=900"));
    }
}
