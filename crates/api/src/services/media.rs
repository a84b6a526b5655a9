//! Uploaded product images.
//!
//! Files are written under the media root as
//! `uploads/product/<uuid>.<ext>`; the stored path is relative to the root
//! and is served back under `/media/`.

use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

/// Directory (relative to the media root) holding product images.
pub const PRODUCT_IMAGE_DIR: &str = "uploads/product";

/// Accepted image extensions, lowercase.
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Errors that can occur while storing media.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The upload is not a supported image type.
    #[error("unsupported image type: {0}")]
    UnsupportedType(String),

    /// The upload was empty.
    #[error("uploaded file is empty")]
    Empty,

    /// Filesystem error.
    #[error("media io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Filesystem-backed media storage.
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    /// Create storage rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The media root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store a product image under a fresh unique name.
    ///
    /// Returns the path relative to the media root.
    ///
    /// # Errors
    ///
    /// - `UnsupportedType` if the original filename has no allowed extension
    /// - `Empty` for a zero-length upload
    /// - `Io` if the file cannot be written
    pub async fn save_product_image(
        &self,
        original_name: Option<&str>,
        bytes: &[u8],
    ) -> Result<String, MediaError> {
        let ext = image_extension(original_name)?;
        if bytes.is_empty() {
            return Err(MediaError::Empty);
        }

        let relative = format!("{PRODUCT_IMAGE_DIR}/{}.{ext}", Uuid::new_v4());
        let dir = self.root.join(PRODUCT_IMAGE_DIR);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(self.root.join(&relative), bytes).await?;

        tracing::debug!(path = %relative, size = bytes.len(), "Stored product image");
        Ok(relative)
    }
}

fn image_extension(original_name: Option<&str>) -> Result<String, MediaError> {
    let name = original_name.unwrap_or_default();
    let ext = Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(MediaError::UnsupportedType(name.to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("bodegon-media-{}", Uuid::new_v4()))
    }

    #[test]
    fn test_image_extension() {
        assert_eq!(image_extension(Some("ron.JPG")).unwrap(), "jpg");
        assert_eq!(image_extension(Some("a.b.webp")).unwrap(), "webp");
        assert!(image_extension(Some("notes.txt")).is_err());
        assert!(image_extension(Some("noext")).is_err());
        assert!(image_extension(None).is_err());
    }

    #[tokio::test]
    async fn test_save_product_image() {
        let root = temp_root();
        let storage = MediaStorage::new(&root);

        let path = storage
            .save_product_image(Some("ron.png"), b"\x89PNG")
            .await
            .unwrap();
        assert!(path.starts_with("uploads/product/"));
        assert!(path.ends_with(".png"));
        assert_eq!(tokio::fs::read(root.join(&path)).await.unwrap(), b"\x89PNG");

        let other = storage
            .save_product_image(Some("ron.png"), b"\x89PNG")
            .await
            .unwrap();
        assert_ne!(path, other);

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_empty_upload() {
        let storage = MediaStorage::new(temp_root());
        let err = storage.save_product_image(Some("ron.png"), b"").await.unwrap_err();
        assert!(matches!(err, MediaError::Empty));
    }
}
