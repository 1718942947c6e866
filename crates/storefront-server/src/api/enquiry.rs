use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use storefront_catalog::{EnquiryItem, EnquiryLink};

use crate::middleware::RequestId;

use super::{map_catalog_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct EnquiryRequest {
    #[serde(default)]
    pub items: Vec<EnquiryItem>,
}

/// POST /api/v1/enquiry — WhatsApp order link for a basket of products.
pub(super) async fn create_enquiry(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<EnquiryRequest>,
) -> Result<Json<ApiResponse<EnquiryLink>>, ApiError> {
    let link = state
        .catalog
        .enquiry_link(
            &body.items,
            &state.public_base_url,
            state.whatsapp_phone.as_deref(),
        )
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(link, req_id.0))
}
