//! Photo uploads for reviews and enquiries.

use std::path::Path;

use thiserror::Error;

use crate::models::UploadedPhoto;

/// Largest accepted photo.
pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

/// Subdirectory of the media root holding review photos.
pub const REVIEW_PHOTO_DIR: &str = "review_photos";

/// Errors from validating or storing an upload.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("file too large: {0} bytes")]
    TooLarge(usize),

    #[error("failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    /// Message shown next to the form.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::UnsupportedType(_) => {
                "Upload a valid image. Allowed extensions are: jpg, jpeg, png, gif.".to_string()
            }
            Self::TooLarge(_) => "Image file too large ( > 5MB )".to_string(),
            Self::Io(_) => "Something went wrong. Please try again.".to_string(),
        }
    }
}

/// Validate an uploaded photo.
///
/// An empty file part (no file chosen) yields `Ok(None)`.
///
/// # Errors
///
/// Returns `UploadError::UnsupportedType` for anything but jpg, jpeg, png or
/// gif, and `UploadError::TooLarge` above [`MAX_PHOTO_BYTES`].
pub fn validate_photo(file_name: &str, bytes: Vec<u8>) -> Result<Option<UploadedPhoto>, UploadError> {
    if file_name.is_empty() && bytes.is_empty() {
        return Ok(None);
    }

    let content_type = content_type_for(file_name)
        .ok_or_else(|| UploadError::UnsupportedType(file_name.to_string()))?;

    if bytes.len() > MAX_PHOTO_BYTES {
        return Err(UploadError::TooLarge(bytes.len()));
    }

    Ok(Some(UploadedPhoto {
        file_name: file_name.to_string(),
        content_type,
        bytes,
    }))
}

/// Write a review photo under the media root.
///
/// Returns the path relative to the media root. The stored name is random;
/// only the extension of the client's file name is kept.
///
/// # Errors
///
/// Returns `UploadError::Io` if the file cannot be written.
pub async fn store_review_photo(
    media_dir: &Path,
    photo: &UploadedPhoto,
) -> Result<String, UploadError> {
    let extension = extension_of(&photo.file_name)
        .ok_or_else(|| UploadError::UnsupportedType(photo.file_name.clone()))?;
    let relative = format!("{REVIEW_PHOTO_DIR}/{}.{extension}", uuid::Uuid::new_v4());

    let dir = media_dir.join(REVIEW_PHOTO_DIR);
    tokio::fs::create_dir_all(&dir).await?;
    tokio::fs::write(media_dir.join(&relative), &photo.bytes).await?;

    tracing::debug!(path = %relative, bytes = photo.bytes.len(), "Stored review photo");
    Ok(relative)
}

fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

fn content_type_for(file_name: &str) -> Option<&'static str> {
    match extension_of(file_name)?.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}
