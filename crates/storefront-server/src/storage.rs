//! Local-disk storage for product images, served under `/uploads`.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Largest accepted image upload.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

const PRODUCTS_DIR: &str = "products";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Only image files (jpeg, png, webp, gif) are allowed")]
    UnsupportedType(String),

    #[error("Image is {size} bytes; the limit is {max} bytes")]
    TooLarge { size: usize, max: usize },

    #[error("Invalid image id")]
    InvalidId,

    #[error("Image not found or already deleted")]
    NotFound,

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Metadata returned for a stored image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredImage {
    pub filename: String,
    /// Path relative to the server's working directory.
    pub path: String,
    /// Public URL path under `/uploads`.
    pub url: String,
    pub public_id: String,
    pub size: usize,
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type.trim().to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

fn is_safe_id(public_id: &str) -> bool {
    !public_id.is_empty()
        && !public_id.contains(['/', '\\'])
        && !public_id.contains("..")
}

#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory served statically under `/uploads`.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn products_dir(&self) -> PathBuf {
        self.root.join(PRODUCTS_DIR)
    }

    /// Writes a product image as `<uuid>.<ext>`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::UnsupportedType`] for non-image content,
    /// [`StorageError::TooLarge`] past [`MAX_IMAGE_BYTES`], or
    /// [`StorageError::Io`] if the file cannot be written.
    pub async fn save(&self, content_type: &str, bytes: &[u8]) -> Result<StoredImage, StorageError> {
        let ext = extension_for(content_type)
            .ok_or_else(|| StorageError::UnsupportedType(content_type.to_string()))?;
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(StorageError::TooLarge {
                size: bytes.len(),
                max: MAX_IMAGE_BYTES,
            });
        }

        let dir = self.products_dir();
        tokio::fs::create_dir_all(&dir).await?;

        let filename = format!("{}.{ext}", Uuid::new_v4());
        let target = dir.join(&filename);
        tokio::fs::write(&target, bytes).await?;

        tracing::info!(file = %target.display(), size = bytes.len(), "image stored");
        Ok(StoredImage {
            path: target.to_string_lossy().into_owned(),
            url: format!("/uploads/{PRODUCTS_DIR}/{filename}"),
            public_id: filename.clone(),
            filename,
            size: bytes.len(),
        })
    }

    /// Removes a previously stored product image.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidId`] for ids that could escape the
    /// products directory, [`StorageError::NotFound`] when no such file
    /// exists, or [`StorageError::Io`] for other filesystem failures.
    pub async fn delete(&self, public_id: &str) -> Result<(), StorageError> {
        if !is_safe_id(public_id) {
            return Err(StorageError::InvalidId);
        }
        match tokio::fs::remove_file(self.products_dir().join(public_id)).await {
            Ok(()) => {
                tracing::info!(public_id, "image deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound),
            Err(e) => Err(e.into()),
        }
    }
}
