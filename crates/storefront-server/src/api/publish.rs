//! Publication handlers: website visibility, orchestrated multi-channel
//! publish, and ad-hoc social posts.

use std::collections::{BTreeMap, BTreeSet};

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use storefront_catalog::{AdminSession, Channel, PublishReport};
use storefront_core::Product;
use storefront_social::{CaptionSource, Platform, PlatformOutcome};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_catalog_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct PublishChannelsRequest {
    #[serde(default)]
    pub channels: Vec<Channel>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SocialPublishRequest {
    #[serde(default)]
    pub product: CaptionSource,
    /// Defaults to every platform.
    pub platforms: Option<Vec<Platform>>,
}

#[derive(Debug, Serialize)]
pub(super) struct SocialPublishResponse {
    pub results: BTreeMap<Platform, PlatformOutcome>,
}

/// POST /api/v1/publish/{id} — set visibility to `published`.
pub(super) async fn publish_website(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<AdminSession>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Product>>, ApiError> {
    let product = state
        .catalog
        .publish_website(&session, id)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(product, req_id.0))
}

/// POST /api/v1/publish/{id}/channels — website first, then social fan-out.
///
/// Per-channel failures are reported in the body; the response is 200
/// unless the product itself cannot be loaded.
pub(super) async fn publish_channels(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<AdminSession>,
    Path(id): Path<Uuid>,
    Json(body): Json<PublishChannelsRequest>,
) -> Result<Json<ApiResponse<PublishReport>>, ApiError> {
    let channels: BTreeSet<Channel> = body.channels.into_iter().collect();
    let report = state
        .orchestrator
        .publish(&session, id, &channels)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(report, req_id.0))
}

/// POST /api/v1/social/publish — post a product snapshot to social platforms.
pub(super) async fn social_publish(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<AdminSession>,
    Json(body): Json<SocialPublishRequest>,
) -> Result<Json<ApiResponse<SocialPublishResponse>>, ApiError> {
    let platforms: BTreeSet<Platform> = body
        .platforms
        .unwrap_or_else(|| vec![Platform::Facebook, Platform::Instagram])
        .into_iter()
        .collect();

    let results = state
        .orchestrator
        .broadcast(&session, &body.product, &platforms)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(SocialPublishResponse { results }, req_id.0))
}
