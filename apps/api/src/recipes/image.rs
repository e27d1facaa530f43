//! Validation and decoding of uploaded ingredient photos.

use base64::{engine::general_purpose, Engine as _};

use crate::errors::AppError;
use crate::llm_client::ImagePart;

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";
pub const ACCEPTED_MIME_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// Decodes base64 image data into an `ImagePart`.
///
/// `image_data` may be bare base64 or a `data:<mime>;base64,<payload>` URL, in
/// which case the URL's MIME type is used when none was supplied.
pub fn decode_image(image_data: &str, mime_type: Option<&str>) -> Result<ImagePart, AppError> {
    let image_data = image_data.trim();
    if image_data.is_empty() {
        return Err(AppError::Validation("Image data is required".to_string()));
    }

    let (url_mime, payload) = split_data_url(image_data);
    let mime_type = mime_type
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .or(url_mime)
        .unwrap_or(DEFAULT_MIME_TYPE)
        .to_lowercase();

    if !ACCEPTED_MIME_TYPES.contains(&mime_type.as_str()) {
        return Err(AppError::Validation(format!(
            "Unsupported image type '{mime_type}'. Use JPEG, PNG or WebP."
        )));
    }

    // A cheap upper bound before allocating: 4 base64 chars encode 3 bytes.
    if payload.len() / 4 * 3 > MAX_IMAGE_BYTES + 3 {
        return Err(AppError::Validation("Image must be 5 MB or smaller".to_string()));
    }

    let bytes = general_purpose::STANDARD
        .decode(payload)
        .map_err(|_| AppError::Validation("Image data must be base64-encoded".to_string()))?;

    if bytes.is_empty() {
        return Err(AppError::Validation("Image data is required".to_string()));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(AppError::Validation("Image must be 5 MB or smaller".to_string()));
    }

    Ok(ImagePart { bytes, mime_type })
}

fn split_data_url(data: &str) -> (Option<&str>, &str) {
    let Some(rest) = data.strip_prefix("data:") else {
        return (None, data);
    };
    match rest.split_once(',') {
        Some((header, payload)) => {
            let mime = header.split(';').next().filter(|m| !m.is_empty());
            (mime, payload)
        }
        None => (None, data),
    }
}
