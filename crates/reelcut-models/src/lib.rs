//! Shared data models for the Reelcut clip worker.
//!
//! This crate provides Serde-serializable types for:
//! - Jobs and their status lifecycle
//! - Projects and platform presets
//! - Transcript segments, clip windows and clip artifacts
//! - Fixed encoding policy

pub mod clip;
pub mod encoding;
pub mod job;
pub mod platform;
pub mod project;
pub mod transcript;

// Re-export common types
pub use clip::{ClipArtifact, ClipWindow};
pub use encoding::EncodingConfig;
pub use job::{Job, JobId, JobStatus};
pub use platform::{AspectRatio, AspectRatioParseError, Platform, PlatformPreset};
pub use project::{Project, ProjectId, ProjectStatus};
pub use transcript::TranscriptSegment;
