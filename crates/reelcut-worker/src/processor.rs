//! Per-job pipeline: fetch, probe, transcribe, place windows, render.
//!
//! Runs inside a claimed job. Status transitions of the job itself are the
//! executor's business; this module only moves the project to
//! `processing` and produces the clip records.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use reelcut_media::VideoInfo;
use reelcut_models::{ClipArtifact, EncodingConfig, Job, Platform, ProjectStatus};
use reelcut_transcribe::TranscriptionRequest;

use crate::clip_pipeline::{self, default_anchors, select_windows, ClipBatch};
use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::retry::retry_async;
use crate::services::PipelineDeps;

/// Shared state for processing jobs.
#[derive(Clone)]
pub struct ProcessingContext {
    pub config: Arc<WorkerConfig>,
    pub deps: PipelineDeps,
}

impl ProcessingContext {
    pub fn new(config: WorkerConfig, deps: PipelineDeps) -> Self {
        Self {
            config: Arc::new(config),
            deps,
        }
    }
}

/// Run the whole pipeline for one claimed job inside `work_dir`.
pub async fn process_job(
    ctx: &ProcessingContext,
    job: &Job,
    work_dir: &Path,
    logger: &JobLogger,
) -> WorkerResult<Vec<ClipArtifact>> {
    let config = ctx.config.as_ref();
    let deps = &ctx.deps;

    let project = deps
        .jobs
        .get_project(&job.project_id)
        .await?
        .ok_or_else(|| WorkerError::project_not_found(job.project_id.as_str()))?;
    deps.jobs
        .set_project_status(&project.id, ProjectStatus::Processing)
        .await?;

    // Source
    let source = work_dir.join(source_file_name(&project.source_path));
    let url = retry_async(&config.retry, "presign", || {
        deps.objects
            .download_url(&config.source_bucket, &project.source_path, config.download_url_ttl)
    })
    .await?;
    let bytes = retry_async(&config.retry, "download", || deps.objects.fetch(&url, &source)).await?;
    logger.log_progress(&format!("Downloaded source ({} bytes)", bytes));

    let info = deps.media.probe(&source).await?;
    let duration = resolve_duration(&info, config, logger)?;

    // Transcript
    let request = TranscriptionRequest::new(&source, duration);
    let transcriber = deps.transcriber.as_ref();
    let request_ref = &request;
    let segments = retry_async(&config.retry, "transcribe", || async move {
        Ok::<_, WorkerError>(transcriber.transcribe(request_ref).await?)
    })
    .await?;
    logger.log_progress(&format!(
        "Transcribed {} segments with {}",
        segments.len(),
        transcriber.name()
    ));

    // Windows
    if project.platform.parse::<Platform>().is_err() {
        logger.log_warning(&format!(
            "Unknown platform {:?}, using {}",
            project.platform,
            Platform::default().as_str()
        ));
    }
    let platform = project.platform();
    let preset = platform.preset();
    let windows = select_windows(
        duration,
        preset.lengths,
        &default_anchors(preset.lengths.len()),
        preset.aspect,
    )?;
    logger.log_progress(&format!(
        "Rendering {} clips for {} ({}:{})",
        windows.len(),
        preset.label,
        preset.aspect.width,
        preset.aspect.height
    ));

    let clips_dir = work_dir.join("clips");
    let batch = ClipBatch {
        project_id: &project.id,
        source: &source,
        clips_dir: &clips_dir,
        windows: &windows,
        segments: &segments,
        has_audio: info.has_audio,
        encoding: EncodingConfig::default().with_fps(preset.fps),
    };
    clip_pipeline::process_clips(deps, config, &batch).await
}

/// Probed duration, or the configured fallback when the container has none.
fn resolve_duration(info: &VideoInfo, config: &WorkerConfig, logger: &JobLogger) -> WorkerResult<f64> {
    match info.duration {
        Some(duration) => Ok(duration),
        None if config.strict_probe => {
            Err(WorkerError::invalid_media("probe reported no duration"))
        }
        None => {
            logger.log_warning(&format!(
                "Probe reported no duration, assuming {}s",
                config.fallback_duration_secs
            ));
            Ok(info.duration_or(config.fallback_duration_secs))
        }
    }
}

/// Local name for the downloaded source, keeping its extension.
fn source_file_name(source_path: &str) -> PathBuf {
    let ext = Path::new(source_path)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or("mp4");
    PathBuf::from(format!("source.{}", ext.to_ascii_lowercase()))
}
