//! Disk persistence for uploaded files.
//!
//! Files are stored under `<root>/<category>/<YYYY>/<MM>/<uuid>.<ext>` and
//! referenced from the database by the path relative to the root. The
//! original filename is never used on disk.

use std::path::{Path, PathBuf};

use chrono::{Datelike, Utc};
use uuid::Uuid;

/// Stores uploads under a configured root directory.
#[derive(Debug)]
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Write one upload to disk, returning its root-relative path.
    pub async fn store(
        &self,
        category: &str,
        original_filename: &str,
        bytes: &[u8],
    ) -> std::io::Result<String> {
        let now = Utc::now();
        let relative = format!(
            "{category}/{:04}/{:02}/{}",
            now.year(),
            now.month(),
            unique_name(original_filename)
        );
        let full = self.root.join(&relative);
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full, bytes).await?;
        tracing::debug!(path = %relative, size = bytes.len(), "Stored upload");
        Ok(relative)
    }

    /// Absolute path for a previously stored relative path.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Remove a previously stored file. A missing file is not an error.
    pub async fn remove(&self, relative: &str) -> std::io::Result<()> {
        match tokio::fs::remove_file(self.root.join(relative)).await {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    /// Best-effort removal of files stored for a submission that did not
    /// commit. Failures are logged and skipped.
    pub async fn discard(&self, paths: &[String]) {
        for path in paths {
            if let Err(err) = self.remove(path).await {
                tracing::warn!(path = %path, error = %err, "Failed to remove orphaned upload");
            }
        }
    }
}

/// Random file name preserving the original extension.
fn unique_name(original: &str) -> String {
    let id = Uuid::new_v4();
    match Path::new(original).extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{id}.{}", ext.to_lowercase()),
        None => id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_name_keeps_extension_lowercased() {
        let name = unique_name("Photo.JPG");
        assert!(name.ends_with(".jpg"));
        assert_eq!(name.len(), 36 + 4);
    }

    #[test]
    fn unique_name_without_extension() {
        let name = unique_name("README");
        assert_eq!(name.len(), 36);
    }

    #[tokio::test]
    async fn store_writes_under_category_and_month() {
        let dir = std::env::temp_dir().join(format!("storage-test-{}", Uuid::new_v4()));
        let storage = DiskStorage::new(dir.clone());

        let relative = storage
            .store("members/photos", "me.png", b"not really a png")
            .await
            .unwrap();
        assert!(relative.starts_with("members/photos/"));
        assert!(relative.ends_with(".png"));

        let stored = tokio::fs::read(storage.resolve(&relative)).await.unwrap();
        assert_eq!(stored, b"not really a png");

        tokio::fs::remove_dir_all(dir).await.unwrap();
    }

    #[tokio::test]
    async fn remove_deletes_stored_file_and_tolerates_missing() {
        let dir = std::env::temp_dir().join(format!("storage-test-{}", Uuid::new_v4()));
        let storage = DiskStorage::new(dir.clone());

        let relative = storage
            .store("members/photos", "me.png", b"bytes")
            .await
            .unwrap();
        storage.remove(&relative).await.unwrap();
        assert!(tokio::fs::read(storage.resolve(&relative)).await.is_err());

        // Removing an already-removed path is a no-op.
        storage.remove(&relative).await.unwrap();

        tokio::fs::remove_dir_all(dir).await.unwrap();
    }
}
