use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info};

use reelcut_media::RenderRequest;
use reelcut_models::{ClipArtifact, ClipWindow, EncodingConfig, ProjectId, TranscriptSegment};
use reelcut_storage::{clip_object_key, ArtifactKind};

use crate::config::WorkerConfig;
use crate::error::WorkerResult;
use crate::metrics;
use crate::retry::retry_async;
use crate::services::{MediaToolkit, PipelineDeps};

/// Local files produced for one window.
#[derive(Debug, Clone)]
pub struct RenderedClip {
    pub window: ClipWindow,
    pub video: PathBuf,
    pub subtitles: PathBuf,
    pub thumbnail: PathBuf,
}

impl RenderedClip {
    fn local_path(&self, kind: ArtifactKind) -> &Path {
        match kind {
            ArtifactKind::Video => &self.video,
            ArtifactKind::Subtitles => &self.subtitles,
            ArtifactKind::Thumbnail => &self.thumbnail,
        }
    }
}

/// Write the window's SRT, render the clip and grab its thumbnail.
pub async fn render_window(
    media: &dyn MediaToolkit,
    source: &Path,
    clips_dir: &Path,
    window: ClipWindow,
    segments: &[TranscriptSegment],
    has_audio: bool,
    encoding: &EncodingConfig,
) -> WorkerResult<RenderedClip> {
    let started = Instant::now();
    let rendered = RenderedClip {
        window,
        video: clips_dir.join(ArtifactKind::Video.file_name(window.index)),
        subtitles: clips_dir.join(ArtifactKind::Subtitles.file_name(window.index)),
        thumbnail: clips_dir.join(ArtifactKind::Thumbnail.file_name(window.index)),
    };

    let cues = reelcut_media::write_srt(&rendered.subtitles, segments, window.start, window.end)
        .await?;
    debug!(clip = window.index, cues = cues, "Subtitles written");

    let request = RenderRequest::for_window(
        &window,
        source,
        &rendered.subtitles,
        &rendered.video,
        has_audio,
    )
    .with_encoding(encoding.clone());
    media.render(&request).await?;

    media
        .thumbnail(&rendered.video, &rendered.thumbnail, window.thumbnail_offset())
        .await?;

    let elapsed = started.elapsed();
    metrics::record_render(elapsed);
    info!(
        clip = window.index,
        start = window.start,
        end = window.end,
        elapsed_ms = elapsed.as_millis() as u64,
        "Clip rendered"
    );

    Ok(rendered)
}

/// Upload a rendered clip's files and record it.
pub async fn publish_clip(
    deps: &PipelineDeps,
    config: &WorkerConfig,
    project_id: &ProjectId,
    rendered: &RenderedClip,
) -> WorkerResult<ClipArtifact> {
    let artifact = ClipArtifact {
        index: rendered.window.index,
        duration_secs: rendered.window.rounded_duration(),
        video_path: upload_artifact(deps, config, project_id, rendered, ArtifactKind::Video).await?,
        subtitle_path: upload_artifact(deps, config, project_id, rendered, ArtifactKind::Subtitles)
            .await?,
        thumbnail_path: upload_artifact(deps, config, project_id, rendered, ArtifactKind::Thumbnail)
            .await?,
    };

    deps.jobs.save_clip(project_id, &artifact).await?;
    debug!(clip = artifact.index, path = %artifact.video_path, "Clip recorded");

    Ok(artifact)
}

async fn upload_artifact(
    deps: &PipelineDeps,
    config: &WorkerConfig,
    project_id: &ProjectId,
    rendered: &RenderedClip,
    kind: ArtifactKind,
) -> WorkerResult<String> {
    let key = clip_object_key(&config.clips_key_prefix, project_id, rendered.window.index, kind)?;
    let path = rendered.local_path(kind);

    retry_async(&config.retry, "upload", || {
        deps.objects
            .upload(&config.clips_bucket, &key, path, kind.content_type())
    })
    .await
}
