use axum::{extract::State, Extension, Json};
use storefront_catalog::{AdminSession, UploadSignature};

use crate::middleware::RequestId;

use super::{map_catalog_error, ApiError, ApiResponse, AppState};

/// POST /api/v1/upload/sign — signed parameters for a direct image upload.
pub(super) async fn sign_upload(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<AdminSession>,
) -> Result<Json<ApiResponse<UploadSignature>>, ApiError> {
    let signature = state
        .uploads
        .sign(&session)
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(signature, req_id.0))
}
