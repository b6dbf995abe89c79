use crate::config::UploadConfig;
use crate::error::AppError;
use actix_multipart::Multipart;
use futures_util::StreamExt;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Upload written to the staging directory, waiting to be relocated
#[derive(Debug)]
pub struct StagedFile {
    pub path: PathBuf,
    pub original_name: String,
    pub mime_type: String,
    pub size: usize,
}

impl StagedFile {
    /// Delete the staged copy. Failures are logged, not returned.
    pub fn remove(&self) {
        if let Err(e) = fs::remove_file(&self.path) {
            log::warn!("Failed to remove staged file {}: {}", self.path.display(), e);
        }
    }
}

/// Text fields plus the optional `file` part of a post form
#[derive(Debug, Default)]
pub struct PostForm {
    pub fields: HashMap<String, String>,
    pub file: Option<StagedFile>,
}

impl PostForm {
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields.get(name).cloned()
    }

    /// Remove the staged file, if any
    pub fn discard(&mut self) {
        if let Some(file) = self.file.take() {
            file.remove();
        }
    }
}

/// Read a multipart post form, writing the `file` part into `upload_dir`.
///
/// Only `image/*` parts are accepted and they may not exceed
/// `limits.max_file_bytes`; text fields are capped at `limits.max_field_bytes`.
/// A file part with no file name and no bytes (an empty file input) counts
/// as no file. On any error nothing is left behind in the staging directory.
pub async fn read_post_form(
    mut payload: Multipart,
    upload_dir: &Path,
    limits: &UploadConfig,
) -> Result<PostForm, AppError> {
    let max_bytes = limits.max_file_bytes;
    let mut form = PostForm::default();

    while let Some(item) = payload.next().await {
        let mut field = match item {
            Ok(field) => field,
            Err(e) => {
                form.discard();
                return Err(AppError::Validation(format!("Malformed form data: {}", e)));
            }
        };

        let name = field.name().to_string();

        if name == "file" {
            if form.file.is_some() {
                form.discard();
                return Err(AppError::Validation("Only one file may be uploaded".to_string()));
            }

            let mime_type = field
                .content_type()
                .map(|m| m.essence_str().to_string())
                .unwrap_or_default();
            let file_name = field
                .content_disposition()
                .get_filename()
                .unwrap_or("")
                .to_string();

            if !mime_type.starts_with("image/") {
                if file_name.is_empty() {
                    match drain(&mut field).await {
                        Ok(0) => continue,
                        Ok(_) => {}
                        Err(e) => {
                            form.discard();
                            return Err(e);
                        }
                    }
                }
                form.discard();
                return Err(AppError::Validation(
                    "Invalid file type, only images are allowed.".to_string(),
                ));
            }

            let original_name = if file_name.is_empty() {
                "upload".to_string()
            } else {
                file_name
            };
            let extension = Path::new(&original_name)
                .extension()
                .and_then(|ext| ext.to_str())
                .unwrap_or("");
            let staged_name = if extension.is_empty() {
                Uuid::new_v4().to_string()
            } else {
                format!("{}.{}", Uuid::new_v4(), extension)
            };

            fs::create_dir_all(upload_dir)?;
            let path = upload_dir.join(staged_name);
            let mut staged = fs::File::create(&path)?;
            let mut size = 0usize;

            while let Some(chunk) = field.next().await {
                let written = chunk
                    .map_err(|e| AppError::Validation(format!("Upload interrupted: {}", e)))
                    .and_then(|bytes| {
                        size += bytes.len();
                        if size > max_bytes {
                            return Err(AppError::Validation(format!(
                                "File too large, limit is {} bytes",
                                max_bytes
                            )));
                        }
                        staged.write_all(&bytes).map_err(AppError::from)
                    });

                if let Err(e) = written {
                    let _ = fs::remove_file(&path);
                    form.discard();
                    return Err(e);
                }
            }

            log::debug!("Staged upload {} as {} ({} bytes)", original_name, path.display(), size);
            form.file = Some(StagedFile {
                path,
                original_name,
                mime_type,
                size,
            });
        } else {
            let mut value = Vec::new();
            while let Some(chunk) = field.next().await {
                match chunk {
                    Ok(bytes) if value.len() + bytes.len() > limits.max_field_bytes => {
                        form.discard();
                        return Err(AppError::Validation(format!(
                            "Field '{}' too large, limit is {} bytes",
                            name, limits.max_field_bytes
                        )));
                    }
                    Ok(bytes) => value.extend_from_slice(&bytes),
                    Err(e) => {
                        form.discard();
                        return Err(AppError::Validation(format!("Malformed form data: {}", e)));
                    }
                }
            }

            match String::from_utf8(value) {
                Ok(text) => {
                    form.fields.insert(name, text);
                }
                Err(_) => {
                    form.discard();
                    return Err(AppError::Validation(format!("Field '{}' is not valid UTF-8", name)));
                }
            }
        }
    }

    Ok(form)
}

/// Consume a field, returning how many bytes it carried
async fn drain(field: &mut actix_multipart::Field) -> Result<usize, AppError> {
    let mut size = 0usize;
    while let Some(chunk) = field.next().await {
        let bytes = chunk.map_err(|e| AppError::Validation(format!("Malformed form data: {}", e)))?;
        size += bytes.len();
    }
    Ok(size)
}
