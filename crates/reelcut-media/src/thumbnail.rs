//! Thumbnail extraction.

use std::path::Path;

use reelcut_models::encoding::THUMBNAIL_QUALITY;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::fs_utils::{move_file, partial_path, remove_if_exists};

fn thumbnail_command(video_path: &Path, output_path: &Path, at_secs: f64) -> FfmpegCommand {
    FfmpegCommand::new(video_path, output_path)
        .seek(at_secs)
        .single_frame()
        .output_arg("-q:v")
        .output_arg(THUMBNAIL_QUALITY.to_string())
        .output_arg("-update")
        .output_arg("1")
}

/// Grab one frame at `at_secs` into a PNG.
pub async fn extract_thumbnail(
    video_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    at_secs: f64,
    runner: &FfmpegRunner,
) -> MediaResult<()> {
    let output_path = output_path.as_ref();

    if !at_secs.is_finite() || at_secs < 0.0 {
        return Err(MediaError::invalid_request(format!(
            "thumbnail position must be non-negative, got {}",
            at_secs
        )));
    }

    let partial = partial_path(output_path);
    let cmd = thumbnail_command(video_path.as_ref(), &partial, at_secs);

    if let Err(e) = runner.run(&cmd).await {
        let _ = remove_if_exists(&partial).await;
        return Err(e);
    }

    move_file(&partial, output_path).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thumbnail_command() {
        let args = thumbnail_command(Path::new("clip1.mp4"), Path::new("clip1.png"), 6.0)
            .build_args();
        let after = |flag: &str| {
            let idx = args.iter().position(|a| a == flag).unwrap();
            args[idx + 1].clone()
        };
        assert_eq!(after("-ss"), "6.000");
        assert_eq!(after("-frames:v"), "1");
        assert_eq!(after("-q:v"), "2");
        assert_eq!(args.last().unwrap(), "clip1.png");
    }

    #[tokio::test]
    async fn test_negative_position_is_rejected() {
        let err = extract_thumbnail("a.mp4", "a.png", -1.0, &FfmpegRunner::new())
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::InvalidRequest(_)));
    }
}
