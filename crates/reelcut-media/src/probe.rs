//! FFprobe video information.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::command::check_ffprobe;
use crate::error::{MediaError, MediaResult};

/// Video file information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    /// Container duration in seconds; `None` when unknown or non-positive
    pub duration: Option<f64>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Frame rate (fps)
    pub fps: f64,
    /// Video codec
    pub codec: String,
    /// Whether the file carries at least one audio stream
    pub has_audio: bool,
}

impl VideoInfo {
    /// Duration, or `fallback` when the container reports none.
    pub fn duration_or(&self, fallback: f64) -> f64 {
        self.duration.unwrap_or(fallback)
    }
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    duration: Option<String>,
}

/// Probe a video file for information.
pub async fn probe_video(path: impl AsRef<Path>) -> MediaResult<VideoInfo> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    check_ffprobe()?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::ffprobe_failed(
            format!("FFprobe exited with {}", output.status),
            Some(String::from_utf8_lossy(&output.stderr).trim().to_string()),
        ));
    }

    let info = parse_probe_output(&output.stdout)?;
    debug!(
        path = %path.display(),
        duration = ?info.duration,
        has_audio = info.has_audio,
        "Probed video"
    );
    Ok(info)
}

/// Interpret ffprobe's JSON report.
pub fn parse_probe_output(stdout: &[u8]) -> MediaResult<VideoInfo> {
    let probe: FfprobeOutput = serde_json::from_slice(stdout)?;

    let video_stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| MediaError::InvalidVideo("No video stream found".to_string()))?;

    let has_audio = probe
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    // Some containers only report duration per stream
    let duration = probe
        .format
        .as_ref()
        .and_then(|f| parse_duration(f.duration.as_deref()))
        .or_else(|| parse_duration(video_stream.duration.as_deref()));

    let fps = video_stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .or_else(|| video_stream.r_frame_rate.as_deref().and_then(parse_frame_rate))
        .unwrap_or(30.0);

    Ok(VideoInfo {
        duration,
        width: video_stream.width.unwrap_or(0),
        height: video_stream.height.unwrap_or(0),
        fps,
        codec: video_stream.codec_name.clone().unwrap_or_default(),
        has_audio,
    })
}

fn parse_duration(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
}

/// Parse frame rate string (e.g., "30/1" or "29.97").
fn parse_frame_rate(s: &str) -> Option<f64> {
    if let Some((num, den)) = s.split_once('/') {
        let num: f64 = num.parse().ok()?;
        let den: f64 = den.parse().ok()?;
        return (den > 0.0 && num > 0.0).then(|| num / den);
    }
    s.parse().ok().filter(|v: &f64| *v > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_rate() {
        assert!((parse_frame_rate("30/1").unwrap() - 30.0).abs() < 0.01);
        assert!((parse_frame_rate("30000/1001").unwrap() - 29.97).abs() < 0.01);
        assert!((parse_frame_rate("29.97").unwrap() - 29.97).abs() < 0.01);
        assert!(parse_frame_rate("0/0").is_none());
    }

    #[test]
    fn test_parse_probe_output() {
        let json = br#"{
            "streams": [
                {"codec_type": "video", "codec_name": "h264", "width": 1920, "height": 1080,
                 "avg_frame_rate": "30000/1001"},
                {"codec_type": "audio", "codec_name": "aac"}
            ],
            "format": {"duration": "182.400000"}
        }"#;

        let info = parse_probe_output(json).unwrap();
        assert_eq!(info.duration, Some(182.4));
        assert_eq!((info.width, info.height), (1920, 1080));
        assert_eq!(info.codec, "h264");
        assert!(info.has_audio);
    }

    #[test]
    fn test_missing_duration_is_none() {
        let json = br#"{
            "streams": [{"codec_type": "video", "codec_name": "vp9"}],
            "format": {"duration": "N/A"}
        }"#;

        let info = parse_probe_output(json).unwrap();
        assert_eq!(info.duration, None);
        assert!(!info.has_audio);
        assert_eq!(info.duration_or(180.0), 180.0);
        assert_eq!(info.fps, 30.0);
    }

    #[test]
    fn test_stream_duration_fallback() {
        let json = br#"{
            "streams": [{"codec_type": "video", "duration": "12.5"}],
            "format": {}
        }"#;
        assert_eq!(parse_probe_output(json).unwrap().duration, Some(12.5));
    }

    #[test]
    fn test_audio_only_is_invalid() {
        let json = br#"{"streams": [{"codec_type": "audio"}], "format": {"duration": "10"}}"#;
        assert!(matches!(
            parse_probe_output(json),
            Err(MediaError::InvalidVideo(_))
        ));
    }

    #[test]
    fn test_garbage_is_json_error() {
        let err = parse_probe_output(b"not json").unwrap_err();
        assert!(err.is_probe_error());
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = probe_video("/nonexistent/source.mp4").await.unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
