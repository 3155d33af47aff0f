//! Cleanup of temporary artifacts.
//!
//! An [`ArtifactGuard`] owns a filesystem path and deletes it when dropped
//! unless [`ArtifactGuard::keep`] was called. Removal failures are logged,
//! never returned: they must not mask the error that caused the unwind.

use std::path::{Path, PathBuf};

/// Deletes the guarded file on drop.
#[derive(Debug)]
pub struct ArtifactGuard {
    path: Option<PathBuf>,
}

impl ArtifactGuard {
    /// Guard `path`. The file does not need to exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// The guarded path.
    pub fn path(&self) -> &Path {
        self.path.as_deref().unwrap_or_else(|| Path::new(""))
    }

    /// Point the guard at the file's new location after a rename.
    pub fn relocate(&mut self, new_path: impl Into<PathBuf>) {
        self.path = Some(new_path.into());
    }

    /// Disarm the guard and return the path; the file is kept.
    pub fn keep(mut self) -> PathBuf {
        self.path.take().unwrap_or_default()
    }
}

impl Drop for ArtifactGuard {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            remove_quietly(&path);
        }
    }
}

/// Remove a file, logging anything other than "already gone".
pub fn remove_quietly(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "removed artifact"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), "failed to remove artifact: {e}"),
    }
}

/// Remove every regular file directly inside `dir`. Returns how many were
/// removed. A missing directory counts as empty.
pub fn sweep_dir(dir: &Path) -> std::io::Result<usize> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let mut removed = 0;
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            remove_quietly(&entry.path());
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn drop_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mp4");
        fs::write(&path, b"data").unwrap();

        drop(ArtifactGuard::new(&path));
        assert!(!path.exists());
    }

    #[test]
    fn keep_preserves_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mp4");
        fs::write(&path, b"data").unwrap();

        let kept = ArtifactGuard::new(&path).keep();
        assert_eq!(kept, path);
        assert!(path.exists());
    }

    #[test]
    fn relocate_follows_rename() {
        let dir = tempfile::tempdir().unwrap();
        let staged = dir.path().join("staged.mp4");
        let promoted = dir.path().join("final.mp4");
        fs::write(&staged, b"data").unwrap();

        let mut guard = ArtifactGuard::new(&staged);
        fs::rename(&staged, &promoted).unwrap();
        guard.relocate(&promoted);
        assert_eq!(guard.path(), promoted.as_path());
        drop(guard);
        assert!(!promoted.exists());
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        drop(ArtifactGuard::new(dir.path().join("never-written.mp4")));
    }

    #[test]
    fn sweep_empties_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a"), b"1").unwrap();
        fs::write(dir.path().join("b"), b"2").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();

        assert_eq!(sweep_dir(dir.path()).unwrap(), 2);
        assert!(dir.path().join("nested").exists());
        assert_eq!(sweep_dir(&dir.path().join("missing")).unwrap(), 0);
    }
}
