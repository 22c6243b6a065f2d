//! Uploaded files on local disk, addressed by paths relative to the media root.

use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Invalid media path: {0}")]
    InvalidPath(String),

    #[error("Failed to write {path}: {source}")]
    Write { path: String, source: io::Error },

    #[error("Failed to delete {path}: {source}")]
    Delete { path: String, source: io::Error },
}

#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
    base_url: String,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>, base_url: &str) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Map a stored relative path onto the filesystem. Absolute paths and
    /// parent-directory components are rejected.
    pub fn path(&self, relative: &str) -> Result<PathBuf, MediaError> {
        let candidate = Path::new(relative);
        let is_plain = !relative.is_empty()
            && candidate
                .components()
                .all(|c| matches!(c, Component::Normal(_)));

        if !is_plain {
            return Err(MediaError::InvalidPath(relative.to_string()));
        }

        Ok(self.root.join(candidate))
    }

    /// Public URL for a stored relative path.
    pub fn url(&self, relative: &str) -> String {
        format!("{}/{}", self.base_url, relative)
    }

    pub async fn save(&self, relative: &str, data: &[u8]) -> Result<(), MediaError> {
        let path = self.path(relative)?;
        let write_error = |source| MediaError::Write {
            path: relative.to_string(),
            source,
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(write_error)?;
        }
        tokio::fs::write(&path, data).await.map_err(write_error)?;

        tracing::debug!("Stored {} bytes at {}", data.len(), relative);
        Ok(())
    }

    /// Remove a stored file. A file that is already gone is not an error.
    pub async fn delete(&self, relative: &str) -> Result<(), MediaError> {
        let path = self.path(relative)?;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(MediaError::Delete {
                path: relative.to_string(),
                source,
            }),
        }
    }
}
