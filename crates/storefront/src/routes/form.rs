//! Multipart form reading for the upload forms.

use std::collections::HashMap;

use axum::extract::Multipart;

use crate::error::AppError;
use crate::models::UploadedPhoto;
use crate::services::uploads::{self, MAX_PHOTO_BYTES};

/// Request body limit for forms carrying a photo.
pub const UPLOAD_BODY_LIMIT: usize = MAX_PHOTO_BYTES + 1024 * 1024;

/// Text fields plus the optional `photo` file of a submitted form.
#[derive(Debug, Default)]
pub struct SubmittedForm {
    fields: HashMap<String, String>,
    /// Photo as submitted, before validation: file name and bytes.
    photo: Option<(String, Vec<u8>)>,
}

impl SubmittedForm {
    /// Drain a multipart body.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if the body is not valid multipart.
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("invalid form data: {e}")))?
        {
            let Some(name) = field.name().map(ToString::to_string) else {
                continue;
            };

            if name == "photo" {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("invalid upload: {e}")))?;
                form.photo = Some((file_name, bytes.to_vec()));
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("invalid form field: {e}")))?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    /// Trimmed text field, empty when absent.
    #[must_use]
    pub fn text(&self, name: &str) -> &str {
        self.fields.get(name).map_or("", |v| v.trim())
    }

    /// Validate and take the photo, if one was chosen.
    ///
    /// # Errors
    ///
    /// Returns the validation error for a disallowed or oversized file.
    pub fn take_photo(&mut self) -> Result<Option<UploadedPhoto>, uploads::UploadError> {
        match self.photo.take() {
            Some((file_name, bytes)) => uploads::validate_photo(&file_name, bytes),
            None => Ok(None),
        }
    }
}
