//! Blob storage seam.
//!
//! Image processing and upload handling are out of scope; entities store
//! relative blob paths and this trait covers the operations the lifecycle
//! layer needs (serving URLs and cleanup on force-delete).

use std::path::{Component, Path, PathBuf};

use crate::errors::{Error, Result};

/// File/blob storage as seen by the rest of the system.
pub trait BlobStore: Send + Sync {
    /// Persist `bytes` under `path`, returning the public URL.
    fn store(&self, path: &str, bytes: &[u8]) -> Result<String>;

    /// Remove the blob at `path`. Removing a missing blob is not an error.
    fn delete(&self, path: &str) -> Result<()>;

    /// Public URL for the blob at `path`.
    fn url(&self, path: &str) -> String;
}

/// Filesystem-backed blob store serving files from a single root directory.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
    base_url: String,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self { root: root.into(), base_url: base_url.into().trim_end_matches('/').to_string() }
    }

    /// Resolve a relative blob path under the root, rejecting traversal.
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let rel = Path::new(path);
        if rel.is_absolute()
            || rel.components().any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(Error::validation_field("Invalid blob path", "path"));
        }
        Ok(self.root.join(rel))
    }
}

impl BlobStore for FsBlobStore {
    fn store(&self, path: &str, bytes: &[u8]) -> Result<String> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).map_err(|source| Error::Io {
                source,
                context: format!("Failed to create blob directory for '{}'", path),
            })?;
        }
        std::fs::write(&full, bytes).map_err(|source| Error::Io {
            source,
            context: format!("Failed to write blob '{}'", path),
        })?;
        Ok(self.url(path))
    }

    fn delete(&self, path: &str) -> Result<()> {
        let full = self.resolve(path)?;
        match std::fs::remove_file(&full) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => {
                Err(Error::Io { source, context: format!("Failed to delete blob '{}'", path) })
            }
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_and_delete_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path(), "/uploads");

        let url = store.store("news/banner.jpg", b"fake-image").unwrap();
        assert_eq!(url, "/uploads/news/banner.jpg");
        assert!(dir.path().join("news/banner.jpg").exists());

        store.delete("news/banner.jpg").unwrap();
        assert!(!dir.path().join("news/banner.jpg").exists());
    }

    #[test]
    fn test_delete_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path(), "/uploads");
        assert!(store.delete("nope.png").is_ok());
    }

    #[test]
    fn test_traversal_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path(), "/uploads");
        assert!(store.store("../escape.txt", b"x").is_err());
        assert!(store.delete("/etc/passwd").is_err());
    }
}
