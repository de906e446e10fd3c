use std::path::Path;

use futures::stream::{self, StreamExt};

use reelcut_models::{ClipArtifact, ClipWindow, EncodingConfig, ProjectId, TranscriptSegment};

use crate::config::WorkerConfig;
use crate::error::WorkerResult;
use crate::services::PipelineDeps;

pub mod clip;
pub mod windows;

pub use clip::{publish_clip, render_window, RenderedClip};
pub use windows::{default_anchors, select_windows, DEFAULT_ANCHORS};

/// Everything the clip stage needs from the earlier stages of a job.
pub struct ClipBatch<'a> {
    pub project_id: &'a ProjectId,
    pub source: &'a Path,
    pub clips_dir: &'a Path,
    pub windows: &'a [ClipWindow],
    pub segments: &'a [TranscriptSegment],
    pub has_audio: bool,
    pub encoding: EncodingConfig,
}

/// Render every window and publish the results.
///
/// Up to `max_parallel_renders` windows encode at once, but uploads and
/// clip records follow window order. The first failure aborts the batch
/// and drops the renders still in flight.
pub async fn process_clips(
    deps: &PipelineDeps,
    config: &WorkerConfig,
    batch: &ClipBatch<'_>,
) -> WorkerResult<Vec<ClipArtifact>> {
    tokio::fs::create_dir_all(batch.clips_dir).await?;

    let mut rendered = stream::iter(batch.windows.iter().copied())
        .map(|window| {
            render_window(
                deps.media.as_ref(),
                batch.source,
                batch.clips_dir,
                window,
                batch.segments,
                batch.has_audio,
                &batch.encoding,
            )
        })
        .buffered(config.max_parallel_renders.max(1));

    let mut artifacts = Vec::with_capacity(batch.windows.len());
    while let Some(result) = rendered.next().await {
        let clip = result?;
        artifacts.push(publish_clip(deps, config, batch.project_id, &clip).await?);
    }

    Ok(artifacts)
}
