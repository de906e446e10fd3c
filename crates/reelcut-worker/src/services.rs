//! Collaborators of the job pipeline.
//!
//! The runner only talks to these traits; `backends` holds the production
//! implementations and tests substitute mocks or in-memory fakes.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use reelcut_firestore::Claim;
use reelcut_media::{MediaResult, RenderRequest, VideoInfo};
use reelcut_models::{ClipArtifact, JobId, Project, ProjectId, ProjectStatus};
use reelcut_transcribe::Transcriber;

use crate::error::WorkerResult;

/// Durable job queue plus the project and clip records it drives.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Atomically claim the next runnable job.
    ///
    /// Stale claims whose retry budget is used up come back as
    /// [`Claim::Abandoned`] and are already marked failed.
    async fn claim_next(&self, stale_after: chrono::Duration, max_attempts: u32)
        -> WorkerResult<Option<Claim>>;

    async fn heartbeat(&self, job_id: &JobId) -> WorkerResult<()>;

    async fn complete(&self, job_id: &JobId) -> WorkerResult<()>;

    async fn fail(&self, job_id: &JobId, message: &str) -> WorkerResult<()>;

    async fn requeue(&self, job_id: &JobId, message: &str) -> WorkerResult<()>;

    async fn get_project(&self, project_id: &ProjectId) -> WorkerResult<Option<Project>>;

    async fn set_project_status(
        &self,
        project_id: &ProjectId,
        status: ProjectStatus,
    ) -> WorkerResult<()>;

    /// Idempotent upsert keyed by project and clip index.
    async fn save_clip(&self, project_id: &ProjectId, clip: &ClipArtifact) -> WorkerResult<()>;
}

/// Object storage for source videos and rendered artifacts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Time-limited GET URL for an object.
    async fn download_url(&self, bucket: &str, key: &str, ttl: Duration) -> WorkerResult<String>;

    /// Download `url` into `dest`, returning the byte count.
    async fn fetch(&self, url: &str, dest: &Path) -> WorkerResult<u64>;

    /// Upload a local file; returns `bucket/key`.
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> WorkerResult<String>;
}

/// ffprobe/ffmpeg operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaToolkit: Send + Sync {
    async fn probe(&self, path: &Path) -> MediaResult<VideoInfo>;

    async fn render(&self, request: &RenderRequest) -> MediaResult<()>;

    async fn thumbnail(&self, video: &Path, output: &Path, at_secs: f64) -> MediaResult<()>;
}

/// Explicitly constructed clients handed to the runner.
#[derive(Clone)]
pub struct PipelineDeps {
    pub jobs: Arc<dyn JobStore>,
    pub objects: Arc<dyn ObjectStore>,
    pub media: Arc<dyn MediaToolkit>,
    pub transcriber: Arc<dyn Transcriber>,
}
