use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;

use crate::application::media::{MediaError, UploadedFile};

use super::ApiState;
use super::error::{ApiError, codes};
use super::models::UploadResponse;

/// Single image upload to the local media root; only common image types are accepted.
pub async fn upload_file(
    State(state): State<ApiState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::bad_request("invalid multipart payload", Some(err.to_string())))?
    {
        if field.name() == Some("file") {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().map(|s| s.to_string());
            let bytes = field.bytes().await.map_err(|err| {
                ApiError::bad_request("failed to read upload", Some(err.to_string()))
            })?;
            file = Some(UploadedFile::new(file_name, content_type, bytes));
            break;
        }
    }

    let file = file.ok_or_else(|| ApiError::bad_request("missing file", None))?;
    let url = state
        .media
        .save_upload(&file)
        .await
        .map_err(media_error_to_api)?;

    Ok(Json(UploadResponse { ok: true, url }))
}

fn media_error_to_api(err: MediaError) -> ApiError {
    match err {
        MediaError::UnsupportedType { .. } => ApiError::detail(
            StatusCode::BAD_REQUEST,
            codes::UNSUPPORTED_TYPE,
            "Unsupported file type",
            Some(err.to_string()),
        ),
        MediaError::EmptyPayload | MediaError::TooLarge { .. } | MediaError::InvalidPath => {
            ApiError::bad_request(err.to_string(), None)
        }
        other => ApiError::detail(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::UPLOAD,
            "Upload failed",
            Some(other.to_string()),
        ),
    }
}
