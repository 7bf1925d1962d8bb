use axum::{
    extract::{Multipart, Path, State},
    Extension, Json,
};
use serde::Serialize;

use crate::middleware::RequestId;
use crate::storage::{StorageError, StoredImage};

use super::{ApiError, ApiResponse, AppState};

const IMAGE_FIELD: &str = "image";

#[derive(Debug, Serialize)]
pub(super) struct DeletedImage {
    public_id: String,
    message: &'static str,
}

fn map_storage_error(req_id: &str, e: &StorageError) -> ApiError {
    match e {
        StorageError::UnsupportedType(_) | StorageError::InvalidId => {
            ApiError::new(req_id, "validation_error", e.to_string())
        }
        StorageError::TooLarge { .. } => ApiError::new(req_id, "payload_too_large", e.to_string()),
        StorageError::NotFound => ApiError::new(req_id, "not_found", e.to_string()),
        StorageError::Io(io) => {
            tracing::error!(error = %io, "image storage failed");
            ApiError::new(req_id, "internal_error", "image storage failed")
        }
    }
}

/// POST /api/v1/uploads/product (multipart, field `image`)
pub(super) async fn upload_product_image(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<StoredImage>>, ApiError> {
    let rid = &req_id.0;
    let bad_body = |e: axum::extract::multipart::MultipartError| {
        tracing::debug!(error = %e, "multipart body rejected");
        ApiError::new(rid, "bad_request", "Malformed multipart body")
    };

    while let Some(field) = multipart.next_field().await.map_err(bad_body)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let content_type = field.content_type().unwrap_or_default().to_owned();
        let bytes = field.bytes().await.map_err(bad_body)?;

        let stored = state
            .images
            .save(&content_type, &bytes)
            .await
            .map_err(|e| map_storage_error(rid, &e))?;
        return Ok(Json(ApiResponse::new(stored, req_id.0)));
    }

    Err(ApiError::new(rid, "bad_request", "No file uploaded"))
}

/// DELETE /api/v1/uploads/{public_id}
pub(super) async fn delete_image(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(public_id): Path<String>,
) -> Result<Json<ApiResponse<DeletedImage>>, ApiError> {
    state
        .images
        .delete(&public_id)
        .await
        .map_err(|e| map_storage_error(&req_id.0, &e))?;

    Ok(Json(ApiResponse::new(
        DeletedImage {
            public_id,
            message: "Image deleted successfully",
        },
        req_id.0,
    )))
}
