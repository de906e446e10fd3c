//! SRT generation for a single clip window.
//!
//! Transcript segments are expressed in source time. A clip only shows the
//! part of each segment that overlaps its window, shifted so the window start
//! becomes `00:00:00,000`.

use std::fmt::Write as _;
use std::path::Path;

use reelcut_models::TranscriptSegment;

use crate::error::MediaResult;

/// One numbered subtitle entry, in clip-local seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleCue {
    pub index: u32,
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Project `segments` onto the window `[window_start, window_end]`.
///
/// A segment is kept when it touches the window at all (inclusive bounds).
/// Cues keep segment order and are numbered from 1. Text is trimmed; a
/// segment whose text is empty still produces a cue so numbering is stable.
pub fn build_cues(
    segments: &[TranscriptSegment],
    window_start: f64,
    window_end: f64,
) -> Vec<SubtitleCue> {
    let span = (window_end - window_start).max(0.0);

    segments
        .iter()
        .filter(|s| s.overlaps(window_start, window_end))
        .zip(1u32..)
        .map(|(s, index)| SubtitleCue {
            index,
            start: (s.start - window_start).max(0.0),
            end: (s.end - window_start).min(span),
            text: s.text.trim().to_string(),
        })
        .collect()
}

/// Format seconds as an SRT timestamp (`HH:MM:SS,mmm`).
///
/// Rounds to the nearest millisecond; negative input is clamped to zero.
pub fn format_timestamp(seconds: f64) -> String {
    let total_ms = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    };

    let hours = total_ms / 3_600_000;
    let minutes = (total_ms / 60_000) % 60;
    let secs = (total_ms / 1000) % 60;
    let millis = total_ms % 1000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

/// Serialize cues as an SRT document.
pub fn render_srt(cues: &[SubtitleCue]) -> String {
    let mut out = String::new();
    for cue in cues {
        // Writing into a String cannot fail
        let _ = write!(
            out,
            "{}\n{} --> {}\n{}\n\n",
            cue.index,
            format_timestamp(cue.start),
            format_timestamp(cue.end),
            cue.text
        );
    }
    out
}

/// Build the cues for a window and write them to `path`.
///
/// Returns the number of cues written.
pub async fn write_srt(
    path: impl AsRef<Path>,
    segments: &[TranscriptSegment],
    window_start: f64,
    window_end: f64,
) -> MediaResult<usize> {
    let cues = build_cues(segments, window_start, window_end);
    tokio::fs::write(path.as_ref(), render_srt(&cues)).await?;
    Ok(cues.len())
}
