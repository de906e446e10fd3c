//! Target platforms and their output presets.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Output aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

impl AspectRatio {
    /// Vertical short-form video (9:16)
    pub const PORTRAIT: AspectRatio = AspectRatio {
        width: 9,
        height: 16,
    };

    /// Square (1:1)
    pub const SQUARE: AspectRatio = AspectRatio {
        width: 1,
        height: 1,
    };

    /// Widescreen (16:9)
    pub const LANDSCAPE: AspectRatio = AspectRatio {
        width: 16,
        height: 9,
    };

    /// Create a new aspect ratio.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns the aspect ratio as a decimal.
    pub fn as_f64(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    /// Output frame size in pixels.
    ///
    /// The long edge is 1920 and the short edge 1080 for the standard
    /// ratios; any other ratio keeps a 1080 short edge, rounded to even.
    pub fn frame_size(&self) -> (u32, u32) {
        match (self.width, self.height) {
            (9, 16) => (1080, 1920),
            (1, 1) => (1080, 1080),
            (16, 9) => (1920, 1080),
            (w, h) if w < h => (1080, even(1080 * h / w)),
            (w, h) => (even(1080 * w / h), 1080),
        }
    }
}

fn even(v: u32) -> u32 {
    v - v % 2
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

impl FromStr for AspectRatio {
    type Err = AspectRatioParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(':')
            .ok_or_else(|| AspectRatioParseError::InvalidFormat(s.to_string()))?;

        let width = w
            .trim()
            .parse()
            .map_err(|_| AspectRatioParseError::InvalidNumber(w.to_string()))?;
        let height = h
            .trim()
            .parse()
            .map_err(|_| AspectRatioParseError::InvalidNumber(h.to_string()))?;

        if width == 0 || height == 0 {
            return Err(AspectRatioParseError::ZeroValue);
        }

        Ok(AspectRatio { width, height })
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        Self::PORTRAIT
    }
}

#[derive(Debug, Error)]
pub enum AspectRatioParseError {
    #[error("Invalid aspect ratio format: {0}, expected 'W:H'")]
    InvalidFormat(String),
    #[error("Invalid number in aspect ratio: {0}")]
    InvalidNumber(String),
    #[error("Aspect ratio cannot have zero values")]
    ZeroValue,
}

/// Platform a project targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    TikTok,
    #[serde(rename = "ytshorts")]
    YtShorts,
    Instagram,
    X,
}

/// Output settings for a platform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlatformPreset {
    /// Display label
    pub label: &'static str,
    /// Output aspect ratio
    pub aspect: AspectRatio,
    /// Target length of each clip, in seconds (one clip per entry)
    pub lengths: &'static [f64],
    /// Output frame rate
    pub fps: u32,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::TikTok,
        Platform::YtShorts,
        Platform::Instagram,
        Platform::X,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::TikTok => "tiktok",
            Platform::YtShorts => "ytshorts",
            Platform::Instagram => "instagram",
            Platform::X => "x",
        }
    }

    /// Parse a platform key, falling back to the default for unknown keys.
    pub fn from_key_or_default(key: &str) -> Self {
        key.parse().unwrap_or_default()
    }

    /// Output preset for this platform.
    pub fn preset(&self) -> PlatformPreset {
        match self {
            Platform::TikTok => PlatformPreset {
                label: "TikTok",
                aspect: AspectRatio::PORTRAIT,
                lengths: &[30.0, 30.0, 30.0],
                fps: 30,
            },
            Platform::YtShorts => PlatformPreset {
                label: "YT Shorts",
                aspect: AspectRatio::PORTRAIT,
                lengths: &[30.0, 45.0, 60.0],
                fps: 30,
            },
            Platform::Instagram => PlatformPreset {
                label: "Instagram",
                aspect: AspectRatio::PORTRAIT,
                lengths: &[20.0, 30.0, 45.0],
                fps: 30,
            },
            Platform::X => PlatformPreset {
                label: "X (Twitter)",
                aspect: AspectRatio::SQUARE,
                lengths: &[20.0, 30.0, 30.0],
                fps: 30,
            },
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tiktok" => Ok(Platform::TikTok),
            "ytshorts" => Ok(Platform::YtShorts),
            "instagram" => Ok(Platform::Instagram),
            "x" => Ok(Platform::X),
            other => Err(format!("unknown platform: {}", other)),
        }
    }
}
