//! Production implementations of the pipeline collaborators.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use reelcut_firestore::{Claim, ClipRepository, FirestoreClient, JobRepository, ProjectRepository};
use reelcut_media::{
    extract_thumbnail, probe_video, render_clip, FfmpegRunner, MediaResult, RenderRequest,
    VideoInfo,
};
use reelcut_models::{ClipArtifact, JobId, Project, ProjectId, ProjectStatus};
use reelcut_storage::{HttpFetcher, R2Client};

use crate::error::WorkerResult;
use crate::services::{JobStore, MediaToolkit, ObjectStore};

/// Firestore-backed job queue.
pub struct FirestoreJobStore {
    jobs: JobRepository,
    projects: ProjectRepository,
    clips: ClipRepository,
}

impl FirestoreJobStore {
    pub fn new(client: FirestoreClient) -> Self {
        Self {
            jobs: JobRepository::new(client.clone()),
            projects: ProjectRepository::new(client.clone()),
            clips: ClipRepository::new(client),
        }
    }
}

#[async_trait]
impl JobStore for FirestoreJobStore {
    async fn claim_next(
        &self,
        stale_after: chrono::Duration,
        max_attempts: u32,
    ) -> WorkerResult<Option<Claim>> {
        Ok(self.jobs.claim_next(stale_after, max_attempts).await?)
    }

    async fn heartbeat(&self, job_id: &JobId) -> WorkerResult<()> {
        Ok(self.jobs.heartbeat(job_id).await?)
    }

    async fn complete(&self, job_id: &JobId) -> WorkerResult<()> {
        Ok(self.jobs.complete(job_id).await?)
    }

    async fn fail(&self, job_id: &JobId, message: &str) -> WorkerResult<()> {
        Ok(self.jobs.fail(job_id, message).await?)
    }

    async fn requeue(&self, job_id: &JobId, message: &str) -> WorkerResult<()> {
        Ok(self.jobs.requeue(job_id, message).await?)
    }

    async fn get_project(&self, project_id: &ProjectId) -> WorkerResult<Option<Project>> {
        Ok(self.projects.get(project_id).await?)
    }

    async fn set_project_status(
        &self,
        project_id: &ProjectId,
        status: ProjectStatus,
    ) -> WorkerResult<()> {
        Ok(self.projects.set_status(project_id, status).await?)
    }

    async fn save_clip(&self, project_id: &ProjectId, clip: &ClipArtifact) -> WorkerResult<()> {
        Ok(self.clips.upsert(project_id, clip).await?)
    }
}

/// R2 for presigning and uploads, plain HTTP for the download.
pub struct R2ObjectStore {
    client: R2Client,
    fetcher: HttpFetcher,
}

impl R2ObjectStore {
    pub fn new(client: R2Client, fetcher: HttpFetcher) -> Self {
        Self { client, fetcher }
    }
}

#[async_trait]
impl ObjectStore for R2ObjectStore {
    async fn download_url(&self, bucket: &str, key: &str, ttl: Duration) -> WorkerResult<String> {
        Ok(self.client.presign_get(bucket, key, ttl).await?)
    }

    async fn fetch(&self, url: &str, dest: &Path) -> WorkerResult<u64> {
        Ok(self.fetcher.fetch_to_file(url, dest).await?)
    }

    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> WorkerResult<String> {
        let stored = self.client.upload_file(bucket, key, path, content_type).await?;
        Ok(stored.to_string())
    }
}

/// Local ffprobe/ffmpeg binaries.
pub struct FfmpegToolkit {
    runner: FfmpegRunner,
}

impl FfmpegToolkit {
    /// Every ffmpeg invocation is killed after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self {
            runner: FfmpegRunner::new().with_timeout(timeout.as_secs().max(1)),
        }
    }
}

#[async_trait]
impl MediaToolkit for FfmpegToolkit {
    async fn probe(&self, path: &Path) -> MediaResult<VideoInfo> {
        probe_video(path).await
    }

    async fn render(&self, request: &RenderRequest) -> MediaResult<()> {
        render_clip(request, &self.runner).await
    }

    async fn thumbnail(&self, video: &Path, output: &Path, at_secs: f64) -> MediaResult<()> {
        extract_thumbnail(video, output, at_secs, &self.runner).await
    }
}
