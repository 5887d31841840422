//! Turning image files into embeddable photo references.

use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine};
use mime_guess::mime;
use thiserror::Error;
use tracing::debug;

use crate::record::PhotoRef;

#[derive(Debug, Error)]
pub enum PhotoError {
    /// Not an image. Callers ignore this silently.
    #[error("Not an image: {}", .0.display())]
    Unsupported(PathBuf),

    #[error("Failed to read photo: {0}")]
    Io(#[from] std::io::Error),
}

/// The image MIME type for `path`, judged by its extension.
pub fn image_mime(path: &Path) -> Option<mime::Mime> {
    mime_guess::from_path(path)
        .first()
        .filter(|m| m.type_() == mime::IMAGE)
}

/// Encode raw image bytes as a data URL.
pub fn encode(mime: &mime::Mime, bytes: &[u8]) -> PhotoRef {
    PhotoRef::from_data_url(format!(
        "data:{};base64,{}",
        mime.essence_str(),
        STANDARD.encode(bytes)
    ))
}

/// Read an image file and encode it. Non-image files are rejected before reading.
pub async fn ingest(path: impl AsRef<Path>) -> Result<PhotoRef, PhotoError> {
    let path = path.as_ref();
    let Some(mime) = image_mime(path) else {
        return Err(PhotoError::Unsupported(path.to_path_buf()));
    };
    let bytes = tokio::fs::read(path).await?;
    debug!(path = %path.display(), bytes = bytes.len(), %mime, "photo ingested");
    Ok(encode(&mime, &bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_mime() {
        assert_eq!(
            image_mime(Path::new("us.png")).map(|m| m.to_string()),
            Some("image/png".to_string())
        );
        assert!(image_mime(Path::new("us.JPG")).is_some());
        assert!(image_mime(Path::new("notes.txt")).is_none());
        assert!(image_mime(Path::new("no-extension")).is_none());
    }

    #[test]
    fn test_encode() {
        let photo = encode(&mime::IMAGE_PNG, b"hi");
        assert_eq!(photo.as_str(), "data:image/png;base64,aGk=");
        assert_eq!(photo.mime(), Some("image/png"));
    }

    #[tokio::test]
    async fn test_ingest_reads_file() {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("first.gif");
        tokio::fs::write(&path, b"GIF89a").await.unwrap();

        let photo = ingest(&path).await.unwrap();
        assert!(photo.as_str().starts_with("data:image/gif;base64,"));
    }

    #[tokio::test]
    async fn test_ingest_rejects_non_images() {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("letter.txt");
        tokio::fs::write(&path, b"dear you").await.unwrap();

        assert!(matches!(
            ingest(&path).await,
            Err(PhotoError::Unsupported(_))
        ));
    }
}
