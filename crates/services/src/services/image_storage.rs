use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use uuid::Uuid;

use super::config::StorageConfig;

#[derive(Debug, Error)]
pub enum ImageStorageError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Invalid storage path: {0}")]
    InvalidPath(String),
}

/// A file part received with a creation request.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl UploadedImage {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Persists uploaded files and maps stored paths to public URLs.
#[async_trait]
pub trait ImageStorage: Send + Sync {
    /// Stores the file and returns its path relative to the storage root.
    async fn store(&self, image: &UploadedImage) -> Result<String, ImageStorageError>;

    fn url_for(&self, path: &str) -> String;

    /// Removes a stored file. Missing files are not an error.
    async fn delete(&self, path: &str) -> Result<(), ImageStorageError>;
}

/// Stores images on the local public disk as `<images_dir>/<uuid>/<file name>`.
#[derive(Debug, Clone)]
pub struct LocalImageStorage {
    root: PathBuf,
    images_dir: String,
    public_url_prefix: String,
}

impl LocalImageStorage {
    pub fn new(root: impl Into<PathBuf>, config: &StorageConfig) -> Self {
        Self {
            root: root.into(),
            images_dir: config.images_dir.clone(),
            public_url_prefix: config.public_url_prefix.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, ImageStorageError> {
        let relative = Path::new(path);
        let is_safe = !path.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !is_safe {
            return Err(ImageStorageError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }

    /// Writes `bytes` to a fresh `<images_dir>/<id>/<name>` path. A failed
    /// write removes the upload directory along with any partial file.
    async fn write_new(&self, path: &str, bytes: &[u8]) -> Result<(), ImageStorageError> {
        let target = self.resolve(path)?;
        let upload_dir = target
            .parent()
            .filter(|parent| *parent != self.root.join(&self.images_dir))
            .ok_or_else(|| ImageStorageError::InvalidPath(path.to_string()))?;
        tokio::fs::create_dir_all(upload_dir).await?;
        if let Err(err) = tokio::fs::write(&target, bytes).await {
            if let Err(cleanup_err) = tokio::fs::remove_dir_all(upload_dir).await {
                tracing::warn!(
                    path = %path,
                    error = %cleanup_err,
                    "Failed to remove partially stored image"
                );
            }
            return Err(err.into());
        }
        Ok(())
    }
}

#[async_trait]
impl ImageStorage for LocalImageStorage {
    async fn store(&self, image: &UploadedImage) -> Result<String, ImageStorageError> {
        let path = format!(
            "{}/{}/{}",
            self.images_dir,
            Uuid::new_v4(),
            sanitize_file_name(&image.file_name)
        );
        self.write_new(&path, &image.bytes).await?;
        tracing::debug!(path = %path, bytes = image.size(), "Stored image");
        Ok(path)
    }

    fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.public_url_prefix,
            path.trim_start_matches('/')
        )
    }

    async fn delete(&self, path: &str) -> Result<(), ImageStorageError> {
        let target = self.resolve(path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err.into()),
        }
        // The per-upload directory only ever holds this one file.
        if let Some(parent) = target.parent() {
            if parent != self.root.join(&self.images_dir)
                && let Err(err) = tokio::fs::remove_dir(parent).await
            {
                tracing::debug!(path = %path, error = %err, "Image directory left in place");
            }
        }
        Ok(())
    }
}

/// Keeps the final path component and replaces anything outside
/// `[A-Za-z0-9._-]` with `_`.
pub fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = sanitized.trim_start_matches('.');
    if trimmed.is_empty() {
        "image".to_string()
    } else {
        trimmed.to_string()
    }
}
