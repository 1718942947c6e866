mod admin;
mod categories;
mod enquiry;
mod products;
mod publish;
mod upload;

use axum::{
    extract::State,
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, patch, post, MethodRouter},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use storefront_catalog::{CatalogError, PublicationOrchestrator, SessionGate, UploadSigner};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::middleware::{
    enforce_rate_limit, request_id, require_admin, RateLimitState, RequestId,
};

#[derive(Clone)]
pub struct AppState {
    pub catalog: storefront_catalog::Catalog,
    pub orchestrator: PublicationOrchestrator,
    pub gate: SessionGate,
    pub uploads: UploadSigner,
    pub public_base_url: String,
    pub whatsapp_phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    /// Number of rows blocking the operation, for `conflict` errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(data: T, request_id: String) -> Json<Self> {
        Json(Self {
            data,
            meta: ResponseMeta::new(request_id),
        })
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
                count: None,
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }

    #[must_use]
    pub fn with_count(mut self, count: Option<u64>) -> Self {
        self.error.count = count;
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_catalog_error(request_id: String, error: &CatalogError) -> ApiError {
    match error {
        CatalogError::Validation(message) => {
            ApiError::new(request_id, "validation_error", message.as_str())
        }
        CatalogError::NotFound(_) => ApiError::new(request_id, "not_found", error.to_string()),
        CatalogError::Conflict { message, count } => {
            ApiError::new(request_id, "conflict", message.as_str()).with_count(*count)
        }
        CatalogError::Unauthorized => {
            ApiError::new(request_id, "unauthorized", error.to_string())
        }
        CatalogError::CascadeFailed { old, new, .. } => {
            tracing::error!(error = %error, %old, %new, "category rename cascade failed");
            ApiError::new(request_id, "internal_error", error.to_string())
        }
        CatalogError::Configuration(_) => {
            tracing::error!(error = %error, "missing configuration");
            ApiError::new(request_id, "internal_error", error.to_string())
        }
        CatalogError::RemoteCall(_) => {
            tracing::error!(error = %error, "storage call failed");
            ApiError::new(request_id, "internal_error", "storage call failed")
        }
    }
}

fn build_cors(public_base_url: &str) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-request-id"),
        ]);

    // Cookies require an exact origin; a wildcard cannot carry credentials.
    match HeaderValue::from_str(public_base_url.trim_end_matches('/')) {
        Ok(origin) if !public_base_url.is_empty() => base
            .allow_origin(AllowOrigin::exact(origin))
            .allow_credentials(true),
        _ => base.allow_origin(tower_http::cors::Any),
    }
}

fn admin_only(
    routes: MethodRouter<AppState>,
    gate: &SessionGate,
    rate_limit: &RateLimitState,
) -> MethodRouter<AppState> {
    routes
        .route_layer(from_fn_with_state(gate.clone(), require_admin))
        .route_layer(from_fn_with_state(rate_limit.clone(), enforce_rate_limit))
}

/// `login_rate_limit` is a separate window so failed password guesses never
/// consume the budget of an authenticated admin.
pub fn build_app(
    state: AppState,
    rate_limit: RateLimitState,
    login_rate_limit: RateLimitState,
) -> Router {
    let gate = state.gate.clone();
    let protect = |routes| admin_only(routes, &gate, &rate_limit);

    Router::new()
        .route("/api/v1/health", get(health))
        .route(
            "/api/v1/products",
            get(products::list_products).merge(protect(post(products::create_product))),
        )
        .route(
            "/api/v1/products/slug/{slug}",
            get(products::get_product_by_slug),
        )
        .route(
            "/api/v1/products/{id}",
            get(products::get_product).merge(protect(
                patch(products::update_product).delete(products::delete_product),
            )),
        )
        .route(
            "/api/v1/categories",
            get(categories::list_categories).merge(protect(post(categories::create_category))),
        )
        .route(
            "/api/v1/categories/{id}",
            get(categories::get_category).merge(protect(
                patch(categories::update_category).delete(categories::delete_category),
            )),
        )
        .route(
            "/api/v1/publish/{id}",
            protect(post(publish::publish_website)),
        )
        .route(
            "/api/v1/publish/{id}/channels",
            protect(post(publish::publish_channels)),
        )
        .route(
            "/api/v1/social/publish",
            protect(post(publish::social_publish)),
        )
        .route(
            "/api/v1/admin/login",
            post(admin::login)
                .route_layer(from_fn_with_state(login_rate_limit, enforce_rate_limit)),
        )
        .route("/api/v1/admin/logout", post(admin::logout))
        .route("/api/v1/admin/me", get(admin::me))
        .route("/api/v1/upload/sign", protect(post(upload::sign_upload)))
        .route("/api/v1/enquiry", post(enquiry::create_enquiry))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors(&state.public_base_url))
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match state.catalog.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: storage unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

pub fn default_login_rate_limit_state() -> RateLimitState {
    RateLimitState::new(10, Duration::from_secs(60))
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
