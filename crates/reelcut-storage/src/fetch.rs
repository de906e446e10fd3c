//! Streaming download of a (presigned) URL to a local file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};

/// HTTP downloader for source media.
#[derive(Clone)]
pub struct HttpFetcher {
    http: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> StorageResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()
            .map_err(|e| StorageError::config_error(format!("HTTP client: {}", e)))?;
        Ok(Self { http })
    }

    /// Download `url` into `dest`, returning the number of bytes written.
    ///
    /// The body is streamed into a `.part` sibling that is renamed onto
    /// `dest` once complete, so `dest` never holds a truncated file.
    pub async fn fetch_to_file(&self, url: &str, dest: impl AsRef<Path>) -> StorageResult<u64> {
        let dest = dest.as_ref();
        let part = part_path(dest);
        debug!("Fetching source into {}", dest.display());

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| StorageError::download_failed(e.without_url().to_string(), None))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StorageError::not_found(redact(url)));
        }
        if !status.is_success() {
            return Err(StorageError::download_failed(
                format!("GET {} returned {}", redact(url), status),
                Some(status.as_u16()),
            ));
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let written = match stream_body(response, &part).await {
            Ok(n) => n,
            Err(e) => {
                let _ = tokio::fs::remove_file(&part).await;
                return Err(e);
            }
        };

        tokio::fs::rename(&part, dest).await?;
        info!("Fetched {} bytes into {}", written, dest.display());
        Ok(written)
    }
}

async fn stream_body(response: reqwest::Response, part: &Path) -> StorageResult<u64> {
    let mut file = tokio::fs::File::create(part).await?;
    let mut stream = response.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk
            .map_err(|e| StorageError::download_failed(e.without_url().to_string(), None))?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    file.sync_all().await?;
    Ok(written)
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    dest.with_file_name(name)
}

/// Drop the query string; presigned URLs carry credentials there.
fn redact(url: &str) -> &str {
    url.split_once('?').map(|(base, _)| base).unwrap_or(url)
}
