//! Filesystem helpers for publishing rendered files.
//!
//! Renders are written next to their destination under a `.partial` name and
//! only moved into place once the encoder has exited cleanly.

use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{MediaError, MediaResult};

/// EXDEV on Linux and macOS.
const EXDEV: i32 = 18;

/// Sibling path used while `final_path` is being written.
///
/// `clip1.mp4` becomes `clip1.partial.mp4`, keeping the extension so ffmpeg
/// still infers the muxer from it.
pub fn partial_path(final_path: &Path) -> PathBuf {
    let stem = final_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match final_path.extension() {
        Some(ext) => format!("{}.partial.{}", stem, ext.to_string_lossy()),
        None => format!("{}.partial", stem),
    };
    final_path.with_file_name(name)
}

/// Move a file from `src` to `dst`, falling back to copy+delete across devices.
pub async fn move_file(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> MediaResult<()> {
    let src = src.as_ref();
    let dst = dst.as_ref();

    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).await?;
    }

    match fs::rename(src, dst).await {
        Ok(()) => Ok(()),
        Err(e) if e.raw_os_error() == Some(EXDEV) => {
            tracing::debug!(
                "Cross-device rename, copying instead: {} -> {}",
                src.display(),
                dst.display()
            );
            copy_and_delete(src, dst).await
        }
        Err(e) => Err(MediaError::from(e)),
    }
}

async fn copy_and_delete(src: &Path, dst: &Path) -> MediaResult<()> {
    // Copy into the destination directory first so the final step is a rename
    let staging = dst.with_extension("tmp");

    fs::copy(src, &staging).await?;

    if let Err(e) = fs::rename(&staging, dst).await {
        let _ = fs::remove_file(&staging).await;
        return Err(e.into());
    }

    if let Err(e) = fs::remove_file(src).await {
        tracing::warn!("Failed to remove {} after copy: {}", src.display(), e);
    }

    Ok(())
}

/// Remove a file, ignoring "not found".
pub async fn remove_if_exists(path: impl AsRef<Path>) -> MediaResult<()> {
    match fs::remove_file(path.as_ref()).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
