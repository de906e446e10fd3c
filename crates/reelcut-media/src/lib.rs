//! FFmpeg CLI wrapper for clip production.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - Progress parsing from `-progress pipe:2`
//! - Cancellation and timeouts via tokio
//! - Probing, window-local SRT generation, clip rendering and thumbnails

pub mod command;
pub mod error;
pub mod filters;
pub mod fs_utils;
pub mod probe;
pub mod progress;
pub mod render;
pub mod subtitle;
pub mod thumbnail;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use probe::{probe_video, VideoInfo};
pub use progress::FfmpegProgress;
pub use render::{render_clip, RenderRequest};
pub use subtitle::{build_cues, format_timestamp, render_srt, write_srt, SubtitleCue};
pub use thumbnail::extract_thumbnail;
