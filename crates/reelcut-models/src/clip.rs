//! Clip windows and rendered clip artifacts.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::platform::AspectRatio;

/// A candidate output region of the source video.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClipWindow {
    /// 1-based position within the job
    pub index: u32,
    /// Source-relative start, seconds
    pub start: f64,
    /// Source-relative end, seconds
    pub end: f64,
    /// Output aspect ratio
    pub aspect: AspectRatio,
}

impl ClipWindow {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Duration rounded to whole seconds, as recorded on the artifact.
    pub fn rounded_duration(&self) -> u32 {
        self.duration().round().max(0.0) as u32
    }

    /// Offset into the clip at which the thumbnail frame is taken.
    pub fn thumbnail_offset(&self) -> f64 {
        self.duration() * 0.2
    }
}

/// Stored result of one rendered window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ClipArtifact {
    /// 1-based position within the job
    #[serde(rename = "idx")]
    pub index: u32,
    /// Clip duration in whole seconds
    #[serde(rename = "duration_sec")]
    pub duration_secs: u32,
    /// Storage path of the encoded video ("bucket/key")
    #[serde(rename = "mp4_path")]
    pub video_path: String,
    /// Storage path of the SRT file
    #[serde(rename = "srt_path")]
    pub subtitle_path: String,
    /// Storage path of the PNG thumbnail
    #[serde(rename = "thumb_path")]
    pub thumbnail_path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_durations() {
        let window = ClipWindow {
            index: 1,
            start: 6.6,
            end: 36.6,
            aspect: AspectRatio::PORTRAIT,
        };
        assert_eq!(window.rounded_duration(), 30);
        assert!((window.thumbnail_offset() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_artifact_wire_names() {
        let artifact = ClipArtifact {
            index: 2,
            duration_secs: 30,
            video_path: "clips/p/clip2.mp4".into(),
            subtitle_path: "clips/p/clip2.srt".into(),
            thumbnail_path: "clips/p/clip2.png".into(),
        };
        let json = serde_json::to_value(&artifact).unwrap();
        assert_eq!(json["idx"], 2);
        assert_eq!(json["duration_sec"], 30);
        assert_eq!(json["thumb_path"], "clips/p/clip2.png");
    }
}
