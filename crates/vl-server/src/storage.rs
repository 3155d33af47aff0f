//! On-disk layout for video bytes.
//!
//! ```text
//! <root>/videos/<uuid>.mp4    persistent, referenced by videos.path
//! <root>/staging/...          uploads, transcode outputs, concat manifests
//! ```
//!
//! Video rows store paths relative to the root (`videos/<uuid>.mp4`) so the
//! root can move without rewriting the database.

use std::path::{Component, Path, PathBuf};

use vl_core::{Error, Result};

const VIDEOS_DIR: &str = "videos";
const STAGING_DIR: &str = "staging";

#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// A relative root is anchored to the current directory once, here, so
    /// every path handed to ffmpeg is absolute.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let root = std::path::absolute(&root).unwrap_or(root);
        Self { root }
    }

    /// Create `videos/` and `staging/` under the root if missing.
    pub fn ensure_layout(&self) -> Result<()> {
        std::fs::create_dir_all(self.videos_dir())?;
        std::fs::create_dir_all(self.staging_dir())?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn videos_dir(&self) -> PathBuf {
        self.root.join(VIDEOS_DIR)
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.root.join(STAGING_DIR)
    }

    /// A fresh scratch file path, e.g. `staging/upload-<uuid>.mp4`.
    pub fn staging_file(&self, prefix: &str) -> PathBuf {
        self.staging_dir()
            .join(format!("{prefix}{}.mp4", uuid::Uuid::new_v4()))
    }

    /// A fresh storage-relative locator for a new video.
    pub fn new_video_locator(&self) -> String {
        format!("{VIDEOS_DIR}/{}.mp4", uuid::Uuid::new_v4())
    }

    /// Resolve a storage-relative locator to an absolute path.
    ///
    /// Absolute paths and any `..`/root components are rejected so that a
    /// stored locator can never point outside the root.
    pub fn resolve(&self, locator: &str) -> Result<PathBuf> {
        let rel = Path::new(locator);
        if locator.is_empty()
            || rel
                .components()
                .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(Error::Internal(format!(
                "storage locator escapes root: {locator}"
            )));
        }
        Ok(self.root.join(rel))
    }

    /// Move a staged file to its final locator. Same-filesystem rename.
    pub async fn promote(&self, staged: &Path, locator: &str) -> Result<PathBuf> {
        let dest = self.resolve(locator)?;
        tokio::fs::rename(staged, &dest).await?;
        tracing::debug!(from = %staged.display(), to = %dest.display(), "promoted");
        Ok(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path());
        storage.ensure_layout().unwrap();
        assert!(storage.videos_dir().is_dir());
        assert!(storage.staging_dir().is_dir());
    }

    #[test]
    fn locators_are_relative_and_unique() {
        let storage = Storage::new("/data");
        let a = storage.new_video_locator();
        let b = storage.new_video_locator();
        assert!(a.starts_with("videos/") && a.ends_with(".mp4"));
        assert_ne!(a, b);
        assert_eq!(storage.resolve(&a).unwrap(), Path::new("/data").join(&a));
    }

    #[test]
    fn relative_root_is_made_absolute() {
        let storage = Storage::new("./data/storage");
        let cwd = std::env::current_dir().unwrap();
        assert!(storage.root().is_absolute());
        assert!(storage.root().starts_with(&cwd));

        let locator = storage.new_video_locator();
        let resolved = storage.resolve(&locator).unwrap();
        assert!(resolved.is_absolute());
        assert!(storage.staging_dir().is_absolute());
        assert!(resolved.ends_with(&locator));
    }

    #[test]
    fn escaping_locators_are_rejected() {
        let storage = Storage::new("/data");
        for bad in ["../etc/passwd", "/etc/passwd", "videos/../../x", ""] {
            assert!(storage.resolve(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn staging_files_live_in_staging() {
        let storage = Storage::new("/data");
        let p = storage.staging_file("upload-");
        assert!(p.starts_with("/data/staging"));
        assert!(p.file_name().unwrap().to_string_lossy().starts_with("upload-"));
    }

    #[tokio::test]
    async fn promote_moves_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path());
        storage.ensure_layout().unwrap();

        let staged = storage.staging_file("");
        std::fs::write(&staged, b"bytes").unwrap();
        let locator = storage.new_video_locator();

        let dest = storage.promote(&staged, &locator).await.unwrap();
        assert!(!staged.exists());
        assert_eq!(std::fs::read(dest).unwrap(), b"bytes");
    }
}
