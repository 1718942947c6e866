//! Cookie session endpoints.

use axum::{
    extract::State,
    http::{header, HeaderMap},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::middleware::{session_token, RequestId};

use super::{map_catalog_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct LoginRequest {
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub(super) struct SessionStatus {
    pub authenticated: bool,
}

type WithCookie = ([(header::HeaderName, String); 1], Json<ApiResponse<SessionStatus>>);

/// POST /api/v1/admin/login — exchange the admin password for a cookie.
pub(super) async fn login(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<LoginRequest>,
) -> Result<WithCookie, ApiError> {
    let (_session, token) = state
        .gate
        .login(&body.password)
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;

    Ok((
        [(header::SET_COOKIE, state.gate.login_cookie(&token))],
        ApiResponse::new(SessionStatus { authenticated: true }, req_id.0),
    ))
}

pub(super) async fn logout(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> WithCookie {
    (
        [(header::SET_COOKIE, state.gate.logout_cookie())],
        ApiResponse::new(
            SessionStatus {
                authenticated: false,
            },
            req_id.0,
        ),
    )
}

pub(super) async fn me(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
) -> Json<ApiResponse<SessionStatus>> {
    let authenticated = state.gate.is_authenticated(session_token(&headers));
    ApiResponse::new(SessionStatus { authenticated }, req_id.0)
}
