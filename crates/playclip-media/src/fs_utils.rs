//! Filesystem helpers for clip outputs.

use std::path::Path;
use tokio::fs;

use crate::error::MediaResult;

/// Create `dir` and any missing parents.
pub async fn ensure_dir(dir: impl AsRef<Path>) -> MediaResult<()> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        fs::create_dir_all(dir).await?;
    }
    Ok(())
}

/// Whether `path` is a regular file with at least one byte.
pub async fn is_nonempty_file(path: impl AsRef<Path>) -> bool {
    match fs::metadata(path.as_ref()).await {
        Ok(meta) => meta.is_file() && meta.len() > 0,
        Err(_) => false,
    }
}

/// Remove `path` if it exists and is empty. Returns whether a file was removed.
///
/// FFmpeg leaves a zero-byte container behind when it fails after opening
/// the output; such a file must not be mistaken for a finished clip.
pub async fn remove_if_empty(path: impl AsRef<Path>) -> MediaResult<bool> {
    let path = path.as_ref();
    match fs::metadata(path).await {
        Ok(meta) if meta.is_file() && meta.len() == 0 => {
            fs::remove_file(path).await?;
            tracing::debug!("Removed empty output {}", path.display());
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// Clean up after a failed ffmpeg run. Cleanup errors are logged, never returned.
pub async fn discard_failed_output(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();
    match remove_if_empty(path).await {
        Ok(removed) => removed,
        Err(e) => {
            tracing::warn!("Could not remove empty output {}: {}", path.display(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_ensure_dir_nested() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a").join("b Clips");
        ensure_dir(&nested).await.unwrap();
        assert!(nested.is_dir());
        // Idempotent
        ensure_dir(&nested).await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_file_handling() {
        let temp = TempDir::new().unwrap();
        let empty = temp.path().join("Play_001.mp4");
        let full = temp.path().join("Play_002.mp4");
        fs::write(&empty, b"").await.unwrap();
        fs::write(&full, b"data").await.unwrap();

        assert!(!is_nonempty_file(&empty).await);
        assert!(is_nonempty_file(&full).await);
        assert!(!is_nonempty_file(temp.path().join("missing.mp4")).await);

        assert!(remove_if_empty(&empty).await.unwrap());
        assert!(!empty.exists());
        assert!(!remove_if_empty(&full).await.unwrap());
        assert!(full.exists());
    }

    #[tokio::test]
    async fn test_discard_failed_output() {
        let temp = TempDir::new().unwrap();
        let empty = temp.path().join("game_kf15.mp4");
        let partial = temp.path().join("Play_003.mp4");
        fs::write(&empty, b"").await.unwrap();
        fs::write(&partial, b"moov").await.unwrap();

        assert!(discard_failed_output(&empty).await);
        assert!(!empty.exists());
        assert!(!discard_failed_output(&partial).await);
        assert!(partial.exists());
        assert!(!discard_failed_output(temp.path().join("never_written.mp4")).await);
    }
}
