//! Video encoding configuration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default audio codec
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
/// Default encoding preset
pub const DEFAULT_PRESET: &str = "veryfast";
/// Default CRF (Constant Rate Factor)
pub const DEFAULT_CRF: u8 = 19;
/// Default audio bitrate
pub const DEFAULT_AUDIO_BITRATE: &str = "128k";
/// Output pixel format
pub const DEFAULT_PIXEL_FORMAT: &str = "yuv420p";
/// Output frame rate
pub const DEFAULT_FPS: u32 = 30;

/// Burned-in subtitle style (ASS `force_style`).
pub const SUBTITLE_FORCE_STYLE: &str =
    "Fontsize=28,PrimaryColour=&HFFFFFF&,OutlineColour=&H000000&,BorderStyle=3,Outline=2,Shadow=0";

/// Progress bar color
pub const PROGRESS_BAR_COLOR: &str = "0xF08640@0.85";
/// Progress bar thickness in pixels
pub const PROGRESS_BAR_HEIGHT: u32 = 8;
/// Gap between the bar and the bottom frame edge
pub const PROGRESS_BAR_MARGIN: u32 = 2;

/// Thumbnail position as a fraction of clip duration
pub const THUMBNAIL_POSITION: f64 = 0.2;
/// PNG quality hint passed with `-q:v`
pub const THUMBNAIL_QUALITY: u8 = 2;

/// Video encoding configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EncodingConfig {
    /// Video codec
    #[serde(default = "default_video_codec")]
    pub codec: String,

    /// Encoding preset
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Constant Rate Factor (quality, 0-51, lower is better)
    #[serde(default = "default_crf")]
    pub crf: u8,

    /// Pixel format
    #[serde(default = "default_pixel_format")]
    pub pixel_format: String,

    /// Output frame rate
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Audio codec
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Audio bitrate
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,

    /// Apply dynamic loudness normalization to the audio track
    #[serde(default = "default_normalize_audio")]
    pub normalize_audio: bool,
}

fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_preset() -> String {
    DEFAULT_PRESET.to_string()
}
fn default_crf() -> u8 {
    DEFAULT_CRF
}
fn default_pixel_format() -> String {
    DEFAULT_PIXEL_FORMAT.to_string()
}
fn default_fps() -> u32 {
    DEFAULT_FPS
}
fn default_audio_codec() -> String {
    DEFAULT_AUDIO_CODEC.to_string()
}
fn default_audio_bitrate() -> String {
    DEFAULT_AUDIO_BITRATE.to_string()
}
fn default_normalize_audio() -> bool {
    true
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            codec: default_video_codec(),
            preset: default_preset(),
            crf: DEFAULT_CRF,
            pixel_format: default_pixel_format(),
            fps: DEFAULT_FPS,
            audio_codec: default_audio_codec(),
            audio_bitrate: default_audio_bitrate(),
            normalize_audio: true,
        }
    }
}

impl EncodingConfig {
    /// Set the frame rate.
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let config = EncodingConfig::default();
        assert_eq!(config.codec, "libx264");
        assert_eq!(config.preset, "veryfast");
        assert_eq!(config.crf, 19);
        assert_eq!(config.pixel_format, "yuv420p");
        assert_eq!(config.fps, 30);
        assert!(config.normalize_audio);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: EncodingConfig = serde_json::from_str(r#"{"crf": 23}"#).unwrap();
        assert_eq!(config.crf, 23);
        assert_eq!(config.preset, "veryfast");
        assert_eq!(config.with_fps(25).fps, 25);
    }
}
