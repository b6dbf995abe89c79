use crate::config::MediaConfig;
use crate::media::{ImageUpload, MediaError, MediaStore};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::{Digest, Sha1};

/// Signed uploads against the Cloudinary image upload API
pub struct CloudinaryStore {
    client: reqwest::Client,
    config: MediaConfig,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl CloudinaryStore {
    pub fn new(config: MediaConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn check_configured(&self) -> Result<(), MediaError> {
        if self.config.cloud_name.is_empty() {
            return Err(MediaError::NotConfigured("CLOUDINARY_CLOUD_NAME"));
        }
        if self.config.api_key.is_empty() {
            return Err(MediaError::NotConfigured("CLOUDINARY_API_KEY"));
        }
        if self.config.api_secret.is_empty() {
            return Err(MediaError::NotConfigured("CLOUDINARY_API_SECRET"));
        }
        Ok(())
    }

    fn upload_url(&self) -> String {
        format!(
            "{}/v1_1/{}/image/upload",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.cloud_name
        )
    }
}

#[async_trait]
impl MediaStore for CloudinaryStore {
    async fn upload(&self, image: ImageUpload, folder: &str) -> Result<String, MediaError> {
        self.check_configured()?;

        let timestamp = chrono::Utc::now().timestamp().to_string();
        let params = [("folder", folder), ("timestamp", timestamp.as_str())];
        let signature = sign(&params, &self.config.api_secret);

        log::debug!(
            "Uploading {} ({} bytes) to folder {}",
            image.file_name,
            image.bytes.len(),
            folder
        );

        let part = Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(&image.mime_type)?;
        let form = Form::new()
            .part("file", part)
            .text("api_key", self.config.api_key.clone())
            .text("folder", folder.to_string())
            .text("timestamp", timestamp)
            .text("signature", signature);

        let response = self.client.post(self.upload_url()).multipart(form).send().await?;
        let status = response.status();
        let body = response.text().await?;

        let url = parse_upload_response(status.is_success(), &body)?;
        log::info!("Uploaded image to {}", url);
        Ok(url)
    }
}

/// `key=value` pairs sorted by key and joined with `&`
pub fn string_to_sign(params: &[(&str, &str)]) -> String {
    let mut sorted: Vec<_> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Lowercase hex SHA-1 of the string to sign followed by the API secret
pub fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(string_to_sign(params).as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

fn parse_upload_response(success: bool, body: &str) -> Result<String, MediaError> {
    if !success {
        let message = serde_json::from_str::<ErrorResponse>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.to_string());
        return Err(MediaError::Rejected(message));
    }

    let parsed: UploadResponse = serde_json::from_str(body)
        .map_err(|e| MediaError::InvalidResponse(e.to_string()))?;
    parsed
        .secure_url
        .ok_or_else(|| MediaError::InvalidResponse("missing secure_url".to_string()))
}
