use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use storefront_catalog::AdminSession;
use storefront_core::{NewProductInput, Product, ProductPatchInput, Visibility};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_catalog_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct ProductListQuery {
    pub visibility: Option<Visibility>,
}

/// GET /api/v1/products — newest first, optionally filtered by visibility.
pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<ApiResponse<Vec<Product>>>, ApiError> {
    let products = state
        .catalog
        .list_products(query.visibility)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(products, req_id.0))
}

pub(super) async fn get_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Product>>, ApiError> {
    let product = state
        .catalog
        .get_product(id)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(product, req_id.0))
}

pub(super) async fn get_product_by_slug(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<Product>>, ApiError> {
    let product = state
        .catalog
        .get_product_by_slug(&slug)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(product, req_id.0))
}

/// POST /api/v1/products — create a product (draft unless stated otherwise).
pub(super) async fn create_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<AdminSession>,
    Json(body): Json<NewProductInput>,
) -> Result<(StatusCode, Json<ApiResponse<Product>>), ApiError> {
    let product = state
        .catalog
        .create_product(&session, body)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;

    Ok((StatusCode::CREATED, ApiResponse::new(product, req_id.0)))
}

/// PATCH /api/v1/products/{id} — sparse update with field normalization.
pub(super) async fn update_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<AdminSession>,
    Path(id): Path<Uuid>,
    Json(body): Json<ProductPatchInput>,
) -> Result<Json<ApiResponse<Product>>, ApiError> {
    let product = state
        .catalog
        .update_product(&session, id, body)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(product, req_id.0))
}

pub(super) async fn delete_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<AdminSession>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    state
        .catalog
        .delete_product(&session, id)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(serde_json::json!({ "deleted": true }), req_id.0))
}
