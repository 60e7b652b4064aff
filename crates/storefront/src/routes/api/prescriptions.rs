//! Prescription image upload.
//!
//! `POST /api/prescriptions` takes one multipart `file` field, stores it in
//! the `prescription-images` bucket and returns its public URL, which the
//! client then submits to the lens flow.

use axum::{
    Json,
    extract::{Multipart, State},
};
use serde::Serialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::OptionalAuth;
use crate::state::AppState;
use crate::storage::{Bucket, object_path};

/// Largest accepted prescription file.
pub const MAX_PRESCRIPTION_BYTES: usize = 10 * 1024 * 1024;

/// Upload response.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

/// Whether a prescription upload of this type is accepted.
#[must_use]
pub fn is_allowed_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence.starts_with("image/") || essence == "application/pdf"
}

/// Store an uploaded prescription image.
#[instrument(skip(state, user, multipart))]
pub async fn upload(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid upload: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        if !is_allowed_content_type(&content_type) {
            return Err(AppError::BadRequest(
                "prescription must be an image or PDF".to_string(),
            ));
        }
        let file_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("invalid upload: {e}")))?;
        if bytes.is_empty() {
            return Err(AppError::BadRequest("empty file".to_string()));
        }

        let prefix = user
            .as_ref()
            .map_or_else(|| "guest".to_string(), |u| format!("user-{}", u.id));
        let path = object_path(&prefix, file_name.as_deref());
        let url = state
            .storage()
            .upload(Bucket::PrescriptionImages, &path, bytes.to_vec(), &content_type)
            .await?;

        return Ok(Json(UploadResponse { url }));
    }

    Err(AppError::BadRequest("missing file field".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_content_types() {
        assert!(is_allowed_content_type("image/png"));
        assert!(is_allowed_content_type("IMAGE/JPEG; charset=binary"));
        assert!(is_allowed_content_type("application/pdf"));
        assert!(!is_allowed_content_type("text/html"));
        assert!(!is_allowed_content_type(""));
    }
}
