//! Content-addressed store for captured card images
//!
//! Files live at `<root>/cards/<category>/<blake3(url)><ext>` and are served
//! under `/images/cards/<category>/<file>`.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::infrastructure::fetch_error::{FetchError, FetchResult};

/// Public URL prefix the store root is served under
pub const PUBLIC_PREFIX: &str = "/images";

/// A file written (or found) in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub path: PathBuf,
    pub file_name: String,
    /// First 8 hex chars of the content address
    pub short_hash: String,
    pub public_url: String,
    /// False when the file was already present
    pub newly_written: bool,
}

#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Hex digest of the source URL
    pub fn content_address(source_url: &str) -> String {
        blake3::hash(source_url.as_bytes()).to_hex().to_string()
    }

    /// File extension for an image content type
    pub fn extension_for(content_type: Option<&str>) -> &'static str {
        let mime = content_type
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase())
            .unwrap_or_default();
        match mime.as_str() {
            "image/png" => ".png",
            "image/webp" => ".webp",
            "image/gif" => ".gif",
            "image/svg+xml" => ".svg",
            "image/avif" => ".avif",
            _ => ".jpg",
        }
    }

    pub fn category_dir(&self, category: &str) -> PathBuf {
        self.root.join("cards").join(category)
    }

    /// Write `bytes` for `source_url` unless a file with the same address exists.
    pub async fn save(
        &self,
        category: &str,
        source_url: &str,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> FetchResult<StoredImage> {
        let hash = Self::content_address(source_url);
        let file_name = format!("{}{}", hash, Self::extension_for(content_type));
        let dir = self.category_dir(category);
        let path = dir.join(&file_name);

        let exists = fs::try_exists(&path).await.map_err(|e| FetchError::io(&path, &e))?;
        if exists {
            debug!("Image already stored: {}", path.display());
        } else {
            fs::create_dir_all(&dir).await.map_err(|e| FetchError::io(&dir, &e))?;
            fs::write(&path, bytes).await.map_err(|e| FetchError::io(&path, &e))?;
            debug!("Stored image {} ({} bytes)", path.display(), bytes.len());
        }

        Ok(StoredImage {
            public_url: format!("{PUBLIC_PREFIX}/cards/{category}/{file_name}"),
            short_hash: hash[..8].to_string(),
            file_name,
            path,
            newly_written: !exists,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_for() {
        assert_eq!(ImageStore::extension_for(Some("image/png")), ".png");
        assert_eq!(ImageStore::extension_for(Some("image/webp; charset=binary")), ".webp");
        assert_eq!(ImageStore::extension_for(Some("image/jpeg")), ".jpg");
        assert_eq!(ImageStore::extension_for(None), ".jpg");
    }

    #[test]
    fn test_content_address_is_stable() {
        let a = ImageStore::content_address("https://lh3.googleusercontent.com/x");
        let b = ImageStore::content_address("https://lh3.googleusercontent.com/x");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[tokio::test]
    async fn test_save_is_content_addressed_and_keeps_existing() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());
        let url = "https://lh3.googleusercontent.com/card";

        let first = store.save("ar", url, Some("image/png"), b"one").await.unwrap();
        assert!(first.newly_written);
        assert!(first.file_name.ends_with(".png"));
        assert_eq!(first.public_url, format!("/images/cards/ar/{}", first.file_name));
        assert_eq!(first.short_hash.len(), 8);

        let second = store.save("ar", url, Some("image/png"), b"two").await.unwrap();
        assert!(!second.newly_written);
        assert_eq!(second.path, first.path);
        assert_eq!(std::fs::read(&first.path).unwrap(), b"one");
    }
}
