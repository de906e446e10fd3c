//! FFmpeg progress parsing.

use serde::{Deserialize, Serialize};

/// Progress information from FFmpeg.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FfmpegProgress {
    /// Current frame number
    pub frame: u64,
    /// Current FPS
    pub fps: f64,
    /// Output time in milliseconds
    pub out_time_ms: i64,
    /// Encoding speed (e.g., 1.5 = 1.5x realtime)
    pub speed: f64,
    /// Whether encoding is complete
    pub is_complete: bool,
}

impl FfmpegProgress {
    /// Progress percentage given total duration in milliseconds.
    pub fn percentage(&self, total_duration_ms: i64) -> f64 {
        if total_duration_ms <= 0 {
            return 0.0;
        }
        ((self.out_time_ms as f64 / total_duration_ms as f64) * 100.0).min(100.0)
    }
}

/// What a single stderr line turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum StderrLine {
    /// A `key=value` line from `-progress pipe:2`
    Progress,
    /// End of a progress block; carries the accumulated snapshot
    Snapshot,
    /// Anything else (ffmpeg diagnostics)
    Diagnostic,
}

/// Fold one stderr line into `current`.
pub(crate) fn parse_progress_line(line: &str, current: &mut FfmpegProgress) -> StderrLine {
    let line = line.trim();

    let Some((key, value)) = line.split_once('=') else {
        return StderrLine::Diagnostic;
    };

    match key {
        // out_time_ms is microseconds despite its name
        "out_time_ms" | "out_time_us" => {
            if let Ok(us) = value.parse::<i64>() {
                current.out_time_ms = us / 1000;
            }
        }
        "frame" => {
            if let Ok(frame) = value.parse() {
                current.frame = frame;
            }
        }
        "fps" => {
            if let Ok(fps) = value.parse() {
                current.fps = fps;
            }
        }
        "speed" => {
            if let Some(speed) = value.strip_suffix('x').and_then(|s| s.trim().parse().ok()) {
                current.speed = speed;
            }
        }
        "progress" => {
            current.is_complete = value == "end";
            return StderrLine::Snapshot;
        }
        "bitrate" | "total_size" | "out_time" | "dup_frames" | "drop_frames" => {}
        k if k.starts_with("stream_") => {}
        _ => return StderrLine::Diagnostic,
    }

    StderrLine::Progress
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percentage() {
        let progress = FfmpegProgress {
            out_time_ms: 5000,
            ..Default::default()
        };

        assert!((progress.percentage(10000) - 50.0).abs() < 0.01);
        assert!((progress.percentage(5000) - 100.0).abs() < 0.01);
        assert_eq!(progress.percentage(0), 0.0);
    }

    #[test]
    fn test_progress_block() {
        let mut progress = FfmpegProgress::default();

        assert_eq!(
            parse_progress_line("out_time_us=5000000", &mut progress),
            StderrLine::Progress
        );
        assert_eq!(progress.out_time_ms, 5000);

        parse_progress_line("speed=1.5x", &mut progress);
        assert!((progress.speed - 1.5).abs() < 0.01);

        parse_progress_line("speed=N/A", &mut progress);
        assert!((progress.speed - 1.5).abs() < 0.01);

        assert_eq!(
            parse_progress_line("progress=end", &mut progress),
            StderrLine::Snapshot
        );
        assert!(progress.is_complete);
    }

    #[test]
    fn test_diagnostics_are_not_progress() {
        let mut progress = FfmpegProgress::default();
        assert_eq!(
            parse_progress_line("Unable to open subtitles.srt", &mut progress),
            StderrLine::Diagnostic
        );
        assert_eq!(
            parse_progress_line("[Parsed_subtitles_0 @ 0x1] fontselect: x=y", &mut progress),
            StderrLine::Diagnostic
        );
    }
}
