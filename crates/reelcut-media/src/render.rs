//! Rendering one clip window into a captioned, letterboxed MP4.

use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, trace, warn};

use reelcut_models::{AspectRatio, ClipWindow, EncodingConfig};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::filters::clip_filter_graph;
use crate::fs_utils::{move_file, partial_path, remove_if_exists};
use crate::progress::FfmpegProgress;

/// Everything needed to encode one clip.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// Full source video
    pub source: PathBuf,
    /// Window-local SRT to burn in
    pub subtitles: PathBuf,
    /// Final MP4 location
    pub output: PathBuf,
    /// Window start in source time, seconds
    pub start: f64,
    /// Window length, seconds
    pub duration: f64,
    /// Output aspect ratio
    pub aspect: AspectRatio,
    /// Whether the source has an audio stream to carry over
    pub has_audio: bool,
    /// Encoder settings
    pub encoding: EncodingConfig,
}

impl RenderRequest {
    pub fn for_window(
        window: &ClipWindow,
        source: impl Into<PathBuf>,
        subtitles: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        has_audio: bool,
    ) -> Self {
        Self {
            source: source.into(),
            subtitles: subtitles.into(),
            output: output.into(),
            start: window.start,
            duration: window.duration(),
            aspect: window.aspect,
            has_audio,
            encoding: EncodingConfig::default(),
        }
    }

    pub fn with_encoding(mut self, encoding: EncodingConfig) -> Self {
        self.encoding = encoding;
        self
    }

    fn validate(&self) -> MediaResult<()> {
        if !self.start.is_finite() || self.start < 0.0 {
            return Err(MediaError::invalid_request(format!(
                "start must be a non-negative number, got {}",
                self.start
            )));
        }
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(MediaError::invalid_request(format!(
                "duration must be positive, got {}",
                self.duration
            )));
        }
        Ok(())
    }

    /// Build the ffmpeg invocation writing to `output`.
    pub fn build_command(&self, output: &Path) -> MediaResult<FfmpegCommand> {
        self.validate()?;

        let (width, height) = self.aspect.frame_size();
        let enc = &self.encoding;
        let with_audio = self.has_audio;

        let graph = clip_filter_graph(
            &self.subtitles,
            width,
            height,
            enc.fps,
            self.duration,
            with_audio && enc.normalize_audio,
        );

        // Input seek resets timestamps, so the window-local SRT lines up at 0
        let mut cmd = FfmpegCommand::new(&self.source, output)
            .seek(self.start)
            .duration(self.duration)
            .filter_complex(graph)
            .map("[v]");

        cmd = match (with_audio, enc.normalize_audio) {
            (true, true) => cmd.map("[a]"),
            (true, false) => cmd.map("0:a:0"),
            (false, _) => cmd.no_audio(),
        };

        cmd = cmd
            .frame_rate(enc.fps)
            .pixel_format(&enc.pixel_format)
            .video_codec(&enc.codec)
            .preset(&enc.preset)
            .crf(enc.crf);

        if with_audio {
            cmd = cmd.audio_codec(&enc.audio_codec).audio_bitrate(&enc.audio_bitrate);
        }

        Ok(cmd.output_args(["-movflags", "+faststart"]))
    }
}

/// Render a clip.
///
/// The encoder writes to a `.partial` sibling that is moved onto
/// `req.output` only after a clean exit. On failure nothing is left at
/// either path.
pub async fn render_clip(req: &RenderRequest, runner: &FfmpegRunner) -> MediaResult<()> {
    let partial = partial_path(&req.output);
    let cmd = req.build_command(&partial)?;

    remove_if_exists(&partial).await?;

    let started = Instant::now();
    debug!(
        source = %req.source.display(),
        start = req.start,
        duration = req.duration,
        aspect = %req.aspect,
        "Rendering clip"
    );

    let total_ms = (req.duration * 1000.0) as i64;
    let progress = move |p: FfmpegProgress| {
        trace!(percent = p.percentage(total_ms), speed = p.speed, "Encoding");
    };

    if let Err(e) = runner.run_with_progress(&cmd, progress).await {
        if let Err(cleanup) = remove_if_exists(&partial).await {
            warn!("Failed to remove {}: {}", partial.display(), cleanup);
        }
        return Err(e);
    }

    move_file(&partial, &req.output).await?;

    info!(
        output = %req.output.display(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Rendered clip"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(start: f64, end: f64, aspect: AspectRatio) -> ClipWindow {
        ClipWindow {
            index: 1,
            start,
            end,
            aspect,
        }
    }

    fn arg_after<'a>(args: &'a [String], flag: &str) -> &'a str {
        let idx = args.iter().position(|a| a == flag).unwrap();
        &args[idx + 1]
    }

    #[test]
    fn test_command_follows_encoding_policy() {
        let req = RenderRequest::for_window(
            &window(66.0, 96.0, AspectRatio::PORTRAIT),
            "/w/source.mp4",
            "/w/clip2.srt",
            "/w/clip2.mp4",
            true,
        );
        let args = req
            .build_command(Path::new("/w/clip2.partial.mp4"))
            .unwrap()
            .build_args();

        assert_eq!(arg_after(&args, "-ss"), "66.000");
        assert_eq!(arg_after(&args, "-t"), "30.000");
        assert_eq!(arg_after(&args, "-r"), "30");
        assert_eq!(arg_after(&args, "-pix_fmt"), "yuv420p");
        assert_eq!(arg_after(&args, "-c:v"), "libx264");
        assert_eq!(arg_after(&args, "-preset"), "veryfast");
        assert_eq!(arg_after(&args, "-crf"), "19");
        assert_eq!(arg_after(&args, "-c:a"), "aac");
        assert_eq!(arg_after(&args, "-movflags"), "+faststart");

        let graph = arg_after(&args, "-filter_complex");
        assert!(graph.contains("scale=1080:1920:force_original_aspect_ratio=decrease"));
        assert!(graph.contains("dynaudnorm"));
        assert!(args.contains(&"[a]".to_string()));
        assert_eq!(args.last().unwrap(), "/w/clip2.partial.mp4");
    }

    #[test]
    fn test_silent_source_drops_audio() {
        let req = RenderRequest::for_window(
            &window(0.0, 20.0, AspectRatio::SQUARE),
            "/w/source.mp4",
            "/w/clip1.srt",
            "/w/clip1.mp4",
            false,
        );
        let args = req
            .build_command(Path::new("/w/clip1.partial.mp4"))
            .unwrap()
            .build_args();

        assert!(args.contains(&"-an".to_string()));
        assert!(!args.contains(&"-c:a".to_string()));
        let graph = arg_after(&args, "-filter_complex");
        assert!(graph.contains("pad=1080:1080"));
        assert!(!graph.contains("dynaudnorm"));
    }

    #[test]
    fn test_rejects_empty_window() {
        let req = RenderRequest::for_window(
            &window(10.0, 10.0, AspectRatio::PORTRAIT),
            "/w/source.mp4",
            "/w/clip1.srt",
            "/w/clip1.mp4",
            true,
        );
        assert!(matches!(
            req.build_command(Path::new("/w/out.mp4")),
            Err(MediaError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_render_leaves_no_output() {
        let dir = tempfile::TempDir::new().unwrap();
        let output = dir.path().join("clip1.mp4");
        let req = RenderRequest::for_window(
            &window(0.0, 5.0, AspectRatio::PORTRAIT),
            dir.path().join("missing.mp4"),
            dir.path().join("clip1.srt"),
            &output,
            false,
        );

        assert!(render_clip(&req, &FfmpegRunner::new()).await.is_err());
        assert!(!output.exists());
        assert!(!partial_path(&output).exists());
    }
}
