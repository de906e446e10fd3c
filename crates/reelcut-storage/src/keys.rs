//! Object key layout for clip artifacts.

use std::fmt;

use reelcut_models::ProjectId;

use crate::error::{StorageError, StorageResult};

/// Files produced for each rendered window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Video,
    Subtitles,
    Thumbnail,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] = [
        ArtifactKind::Video,
        ArtifactKind::Subtitles,
        ArtifactKind::Thumbnail,
    ];

    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Video => "mp4",
            ArtifactKind::Subtitles => "srt",
            ArtifactKind::Thumbnail => "png",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ArtifactKind::Video => "video/mp4",
            ArtifactKind::Subtitles => "text/plain",
            ArtifactKind::Thumbnail => "image/png",
        }
    }

    /// Local and remote file name for window `index`, e.g. `clip2.srt`.
    pub fn file_name(&self, index: u32) -> String {
        format!("clip{}.{}", index, self.extension())
    }
}

/// `<prefix>/<project_id>/clip<index>.<ext>`
///
/// Keys are deterministic so a re-run overwrites rather than duplicates.
pub fn clip_object_key(
    prefix: &str,
    project_id: &ProjectId,
    index: u32,
    kind: ArtifactKind,
) -> StorageResult<String> {
    let id = project_id.as_str();
    if id.is_empty() || id.contains('/') || id.contains("..") {
        return Err(StorageError::invalid_key(format!("project id {:?}", id)));
    }

    let file = kind.file_name(index);
    let prefix = prefix.trim_matches('/');
    Ok(if prefix.is_empty() {
        format!("{}/{}", id, file)
    } else {
        format!("{}/{}/{}", prefix, id, file)
    })
}

/// Location of a stored object, rendered as `bucket/key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectPath {
    pub bucket: String,
    pub key: String,
}

impl ObjectPath {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}
