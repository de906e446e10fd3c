//! Project (source asset) models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::platform::Platform;

/// Unique identifier for a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ProjectId(pub String);

impl ProjectId {
    /// Generate a new random project ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ProjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ProjectId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProjectId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Project status as mirrored for the status API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Source uploaded, nothing requested yet
    #[default]
    Uploaded,
    /// A job has been enqueued
    Queued,
    /// A worker is rendering clips
    Processing,
    /// Clips are available
    Done,
    /// The last job failed
    Error,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Uploaded => "uploaded",
            ProjectStatus::Queued => "queued",
            ProjectStatus::Processing => "processing",
            ProjectStatus::Done => "done",
            ProjectStatus::Error => "error",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uploaded" => Ok(ProjectStatus::Uploaded),
            "queued" => Ok(ProjectStatus::Queued),
            "processing" => Ok(ProjectStatus::Processing),
            "done" => Ok(ProjectStatus::Done),
            "error" => Ok(ProjectStatus::Error),
            other => Err(format!("unknown project status: {}", other)),
        }
    }
}

/// Source asset to cut clips from.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Project {
    /// Unique project ID
    pub id: ProjectId,

    /// Object key of the uploaded source inside the source bucket
    pub source_path: String,

    /// Raw platform key as stored by the API layer (e.g. "tiktok")
    pub platform: String,

    /// Status mirror
    #[serde(default)]
    pub status: ProjectStatus,
}

impl Project {
    /// Resolve the platform key, falling back to the default platform for unknown keys.
    pub fn platform(&self) -> Platform {
        Platform::from_key_or_default(&self.platform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_platform_resolution() {
        let project = Project {
            id: ProjectId::from("p1"),
            source_path: "uploads/p1/source.mp4".into(),
            platform: "x".into(),
            status: ProjectStatus::Uploaded,
        };
        assert_eq!(project.platform(), Platform::X);

        let unknown = Project {
            platform: "myspace".into(),
            ..project
        };
        assert_eq!(unknown.platform(), Platform::TikTok);
    }

    #[test]
    fn test_project_status_parse() {
        assert_eq!("done".parse::<ProjectStatus>().unwrap(), ProjectStatus::Done);
        assert!("finished".parse::<ProjectStatus>().is_err());
    }
}
