use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("request to media host failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("media host rejected upload: {0}")]
    Rejected(String),
    #[error("unexpected response from media host: {0}")]
    InvalidResponse(String),
    #[error("media host is not configured: missing {0}")]
    NotConfigured(&'static str),
    #[error("failed to read staged file: {0}")]
    Io(#[from] std::io::Error),
}

/// An image ready to be sent to the media host
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub async fn from_file(path: &Path, mime_type: &str) -> Result<Self, MediaError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();

        Ok(Self {
            file_name,
            mime_type: mime_type.to_string(),
            bytes,
        })
    }
}

/// Remote image host. Returns the stable public URL of the stored image.
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn upload(&self, image: ImageUpload, folder: &str) -> Result<String, MediaError>;
}

/// Upload a staged cover image and return its hosted URL. The staged file is
/// left in place; removing it is up to the caller.
pub async fn upload_cover(
    media: &dyn MediaStore,
    path: &Path,
    mime_type: &str,
    folder: &str,
) -> Result<String, MediaError> {
    let image = ImageUpload::from_file(path, mime_type).await?;
    media.upload(image, folder).await
}
