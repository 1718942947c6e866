use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use serde::Deserialize;
use storefront_catalog::AdminSession;
use storefront_core::{Category, CategoryPatchInput};
use uuid::Uuid;

use crate::middleware::{session_token, RequestId};

use super::{map_catalog_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct CategoryListQuery {
    /// Include inactive categories. Admin only.
    #[serde(default)]
    pub all: bool,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateCategoryRequest {
    #[serde(default)]
    pub name: String,
    pub sort: Option<i32>,
}

/// GET /api/v1/categories — active categories by `(sort, name)`.
///
/// `?all=true` also returns inactive ones and needs an admin session.
pub(super) async fn list_categories(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
    Query(query): Query<CategoryListQuery>,
) -> Result<Json<ApiResponse<Vec<Category>>>, ApiError> {
    if query.all && !state.gate.is_authenticated(session_token(&headers)) {
        return Err(ApiError::new(
            req_id.0,
            "unauthorized",
            "listing inactive categories requires an admin session",
        ));
    }

    let categories = state
        .catalog
        .list_categories(!query.all)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(categories, req_id.0))
}

pub(super) async fn get_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Category>>, ApiError> {
    let category = state
        .catalog
        .get_category(id)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(category, req_id.0))
}

/// POST /api/v1/categories — sort defaults to ten past the current maximum.
pub(super) async fn create_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<AdminSession>,
    Json(body): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Category>>), ApiError> {
    let category = state
        .catalog
        .create_category(&session, &body.name, body.sort)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;

    Ok((StatusCode::CREATED, ApiResponse::new(category, req_id.0)))
}

/// PATCH /api/v1/categories/{id} — a rename re-tags every product.
pub(super) async fn update_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<AdminSession>,
    Path(id): Path<Uuid>,
    Json(body): Json<CategoryPatchInput>,
) -> Result<Json<ApiResponse<Category>>, ApiError> {
    let category = state
        .catalog
        .update_category(&session, id, body)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(category, req_id.0))
}

/// DELETE /api/v1/categories/{id} — 409 with a count while products use it.
pub(super) async fn delete_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<AdminSession>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    state
        .catalog
        .delete_category(&session, id)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(serde_json::json!({ "deleted": true }), req_id.0))
}
