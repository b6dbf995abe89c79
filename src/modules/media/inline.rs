//! Relocation of images embedded in post content.
//!
//! Scanning and substitution are pure; [`rewrite_inline_images`] drives the
//! uploads in between.

use crate::media::{ImageUpload, MediaError, MediaStore};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use regex::Regex;
use std::sync::OnceLock;

/// An image embedded as a base64 data URI
#[derive(Debug, Clone, PartialEq)]
pub struct InlineImage {
    pub data_uri: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// One data URI replaced by a hosted URL
#[derive(Debug, Clone, PartialEq)]
pub struct Relocation {
    pub data_uri: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rewrite {
    pub content: String,
    pub uploads: Vec<Relocation>,
}

fn img_src_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"<img src="([^"]+)""#).expect("static regex"))
}

/// Split `data:image/png;base64,AAAA` into its MIME type and decoded bytes.
fn decode_data_uri(uri: &str) -> Option<(String, Vec<u8>)> {
    let rest = uri.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    let mime_type = meta.strip_suffix(";base64")?;
    if !mime_type.starts_with("image/") {
        return None;
    }
    let bytes = STANDARD.decode(payload.trim()).ok()?;
    Some((mime_type.to_string(), bytes))
}

fn extension_for(mime_type: &str) -> &str {
    match mime_type {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/svg+xml" => "svg",
        other => other.strip_prefix("image/").unwrap_or("bin"),
    }
}

/// Distinct data-URI images referenced by `<img src="...">`, in first-seen order.
pub fn find_inline_images(content: &str) -> Vec<InlineImage> {
    let mut found: Vec<InlineImage> = Vec::new();

    for caps in img_src_pattern().captures_iter(content) {
        let src = &caps[1];
        if !src.starts_with("data:image/") {
            continue;
        }
        if found.iter().any(|img| img.data_uri == src) {
            continue;
        }

        match decode_data_uri(src) {
            Some((mime_type, bytes)) => found.push(InlineImage {
                data_uri: src.to_string(),
                mime_type,
                bytes,
            }),
            None => log::warn!("Skipping inline image with undecodable data URI"),
        }
    }

    found
}

/// Replace every occurrence of each data URI with its hosted URL.
///
/// Longer URIs go first so one that is a prefix of another cannot clobber it.
pub fn replace_all(content: &str, relocations: &[Relocation]) -> String {
    let mut ordered: Vec<&Relocation> = relocations.iter().collect();
    ordered.sort_by(|a, b| b.data_uri.len().cmp(&a.data_uri.len()));
    ordered
        .into_iter()
        .fold(content.to_string(), |acc, r| acc.replace(&r.data_uri, &r.url))
}

/// Upload each distinct inline image once and point the content at the
/// hosted copies.
pub async fn rewrite_inline_images(
    media: &dyn MediaStore,
    content: &str,
    folder: &str,
) -> Result<Rewrite, MediaError> {
    let images = find_inline_images(content);
    let mut uploads = Vec::with_capacity(images.len());

    for (index, image) in images.into_iter().enumerate() {
        let upload = ImageUpload {
            file_name: format!("inline-{}.{}", index, extension_for(&image.mime_type)),
            mime_type: image.mime_type,
            bytes: image.bytes,
        };
        let url = media.upload(upload, folder).await?;
        uploads.push(Relocation { data_uri: image.data_uri, url });
    }

    if !uploads.is_empty() {
        log::info!("Relocated {} inline image(s) to {}", uploads.len(), folder);
    }

    Ok(Rewrite {
        content: replace_all(content, &uploads),
        uploads,
    })
}
