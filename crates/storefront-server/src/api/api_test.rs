use super::*;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request};
use axum::response::Response;
use serde_json::{json, Value};
use std::sync::Arc;
use storefront_catalog::Catalog;
use storefront_core::{SocialConfig, UploadConfig};
use storefront_db::{MemoryStore, StoreOp};
use storefront_social::Broadcaster;
use tower::ServiceExt;

const PASSWORD: &str = "test-password";

fn social_config() -> SocialConfig {
    SocialConfig {
        enabled: false,
        graph_base_url: "http://127.0.0.1:9".to_string(),
        graph_version: "v19.0".to_string(),
        request_timeout_secs: 1,
        facebook_page_id: None,
        facebook_page_token: None,
        instagram_user_id: None,
        instagram_token: None,
    }
}

fn state(store: Arc<MemoryStore>) -> AppState {
    let catalog = Catalog::new(store, Duration::from_secs(2));
    let broadcaster = Broadcaster::from_config(social_config()).expect("broadcaster");
    let orchestrator =
        PublicationOrchestrator::new(catalog.clone(), Arc::new(broadcaster), "https://shop.example.com");
    AppState {
        catalog,
        orchestrator,
        gate: SessionGate::new(PASSWORD, false),
        uploads: UploadSigner::new(UploadConfig {
            cloud_name: Some("demo".to_string()),
            api_key: Some("key-1".to_string()),
            api_secret: Some("s3cret".to_string()),
            upload_preset: "storefront_unsigned".to_string(),
        }),
        public_base_url: "https://shop.example.com".to_string(),
        whatsapp_phone: Some("+254 700 000000".to_string()),
    }
}

fn app() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (
        build_app(
            state(Arc::clone(&store)),
            default_rate_limit_state(),
            default_login_rate_limit_state(),
        ),
        store,
    )
}

fn session_cookie() -> String {
    let (_session, token) = SessionGate::new(PASSWORD, false)
        .login(PASSWORD)
        .expect("login");
    format!("admin_token={token}")
}

fn request(method: &str, uri: &str, cookie: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    serde_json::from_slice(&bytes).expect("json parse")
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.expect("response");
    let status = response.status();
    (status, json_body(response).await)
}

async fn create_product(app: &Router, body: Value) -> Value {
    let cookie = session_cookie();
    let (status, json) = send(app, request("POST", "/api/v1/products", Some(cookie.as_str()), Some(body))).await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    json["data"].clone()
}

#[test]
fn api_error_validation_error_maps_to_bad_request() {
    let response = ApiError::new("req-1", "validation_error", "invalid input").into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn conflict_error_carries_blocking_count() {
    let error = map_catalog_error(
        "req-1".to_string(),
        &CatalogError::Conflict {
            message: "Category is in use by 2 product(s).".to_string(),
            count: Some(2),
        },
    );
    assert_eq!(error.error.code, "conflict");
    assert_eq!(error.error.count, Some(2));
    assert_eq!(error.into_response().status(), StatusCode::CONFLICT);
}

#[test]
fn storage_failure_hides_detail() {
    let error = map_catalog_error(
        "req-1".to_string(),
        &CatalogError::RemoteCall("connection refused on 10.0.0.3".to_string()),
    );
    assert_eq!(error.error.code, "internal_error");
    assert_eq!(error.error.message, "storage call failed");
}

#[tokio::test]
async fn health_reports_ok() {
    let (app, _store) = app();
    let (status, json) = send(&app, request("GET", "/api/v1/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "ok");
    assert!(json["meta"]["request_id"].is_string());
}

#[tokio::test]
async fn health_degraded_when_store_unreachable() {
    let (app, store) = app();
    store.fail_on(StoreOp::Ping).await;
    let (status, json) = send(&app, request("GET", "/api/v1/health", None, None)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["data"]["database"], "unavailable");
}

#[tokio::test]
async fn supplied_request_id_is_echoed() {
    let (app, _store) = app();
    let req = Request::builder()
        .uri("/api/v1/health")
        .header("x-request-id", "req-abc")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(req).await.expect("response");
    assert_eq!(
        response.headers().get("x-request-id").and_then(|v| v.to_str().ok()),
        Some("req-abc")
    );
    let json = json_body(response).await;
    assert_eq!(json["meta"]["request_id"], "req-abc");
}

#[tokio::test]
async fn create_product_requires_session() {
    let (app, store) = app();
    let (status, json) = send(
        &app,
        request("POST", "/api/v1/products", None, Some(json!({ "name": "Red Heels" }))),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"]["code"], "unauthorized");
    assert!(store.products().await.is_empty());
}

#[tokio::test]
async fn forged_cookie_is_rejected() {
    let (app, _store) = app();
    let (status, _json) = send(
        &app,
        request(
            "POST",
            "/api/v1/products",
            Some("admin_token=not-the-token"),
            Some(json!({ "name": "Red Heels" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn created_product_takes_documented_defaults() {
    let (app, _store) = app();
    let product = create_product(&app, json!({ "name": "Red Heels", "price": 2000 })).await;

    let slug = product["slug"].as_str().expect("slug");
    let suffix = slug.strip_prefix("red-heels-").expect("slug prefix");
    assert_eq!(suffix.len(), 4);
    assert!(suffix.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    assert_eq!(product["visibility"], "draft");
    assert_eq!(product["in_stock"], true);
    assert!(product["stock_status"].is_null());
    assert_eq!(product["currency"], "KES");

    let id = product["id"].as_str().expect("id");
    let (status, json) = send(&app, request("GET", &format!("/api/v1/products/{id}"), None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["name"], "Red Heels");

    let (status, json) = send(
        &app,
        request("GET", &format!("/api/v1/products/slug/{slug}"), None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["id"], id);
}

#[tokio::test]
async fn patch_normalizes_offer_and_stock() {
    let (app, _store) = app();
    let product = create_product(&app, json!({ "name": "Tote" })).await;
    let id = product["id"].as_str().expect("id");
    let cookie = session_cookie();

    let (status, json) = send(
        &app,
        request(
            "PATCH",
            &format!("/api/v1/products/{id}"),
            Some(cookie.as_str()),
            Some(json!({ "offer_percent": 40, "stock_status": "restock" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert!(json["data"]["offer_percent"].is_null());
    assert_eq!(json["data"]["stock_status"], "restock");
    assert_eq!(json["data"]["in_stock"], false);
}

#[tokio::test]
async fn patch_unknown_product_is_not_found() {
    let (app, _store) = app();
    let cookie = session_cookie();
    let (status, json) = send(
        &app,
        request(
            "PATCH",
            &format!("/api/v1/products/{}", uuid::Uuid::new_v4()),
            Some(cookie.as_str()),
            Some(json!({ "name": "Ghost" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "not_found");
}

#[tokio::test]
async fn public_listing_filters_by_visibility() {
    let (app, _store) = app();
    create_product(&app, json!({ "name": "Draft Bag" })).await;
    create_product(&app, json!({ "name": "Live Bag", "visibility": "published" })).await;

    let (status, json) = send(
        &app,
        request("GET", "/api/v1/products?visibility=published", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = json["data"]
        .as_array()
        .expect("data array")
        .iter()
        .filter_map(|p| p["name"].as_str())
        .collect();
    assert_eq!(names, vec!["Live Bag"]);
}

#[tokio::test]
async fn categories_list_in_sort_order() {
    let (app, _store) = app();
    let cookie = session_cookie();
    for body in [json!({ "name": "Shoes" }), json!({ "name": "Bags", "sort": 5 })] {
        let (status, _json) = send(
            &app,
            request("POST", "/api/v1/categories", Some(cookie.as_str()), Some(body)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, json) = send(&app, request("GET", "/api/v1/categories", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    let listed: Vec<(String, i64)> = json["data"]
        .as_array()
        .expect("data array")
        .iter()
        .map(|c| {
            (
                c["name"].as_str().unwrap_or_default().to_string(),
                c["sort"].as_i64().unwrap_or_default(),
            )
        })
        .collect();
    assert_eq!(
        listed,
        vec![("Bags".to_string(), 5), ("Shoes".to_string(), 10)]
    );
}

#[tokio::test]
async fn listing_inactive_categories_requires_session() {
    let (app, _store) = app();
    let (status, _json) = send(&app, request("GET", "/api/v1/categories?all=true", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let cookie = session_cookie();
    let (status, _json) = send(
        &app,
        request("GET", "/api/v1/categories?all=true", Some(cookie.as_str()), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn deleting_category_in_use_is_conflict_with_count() {
    let (app, store) = app();
    let cookie = session_cookie();
    let (_status, json) = send(
        &app,
        request("POST", "/api/v1/categories", Some(cookie.as_str()), Some(json!({ "name": "Shoes" }))),
    )
    .await;
    let category_id = json["data"]["id"].as_str().expect("id").to_string();
    create_product(&app, json!({ "name": "Red Heels", "category": "Shoes" })).await;

    let (status, json) = send(
        &app,
        request(
            "DELETE",
            &format!("/api/v1/categories/{category_id}"),
            Some(cookie.as_str()),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"]["count"], 1);
    assert_eq!(store.categories().await.len(), 1);
}

#[tokio::test]
async fn renaming_category_retags_products() {
    let (app, store) = app();
    let cookie = session_cookie();
    let (_status, json) = send(
        &app,
        request("POST", "/api/v1/categories", Some(cookie.as_str()), Some(json!({ "name": "Shoes" }))),
    )
    .await;
    let category_id = json["data"]["id"].as_str().expect("id").to_string();
    create_product(&app, json!({ "name": "Red Heels", "category": "Shoes" })).await;

    let (status, json) = send(
        &app,
        request(
            "PATCH",
            &format!("/api/v1/categories/{category_id}"),
            Some(cookie.as_str()),
            Some(json!({ "name": "Footwear" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["slug"], "footwear");
    let products = store.products().await;
    assert_eq!(products[0].category.as_deref(), Some("Footwear"));
}

#[tokio::test]
async fn orchestrated_publish_reports_each_channel() {
    let (app, store) = app();
    let product = create_product(
        &app,
        json!({ "name": "Red Heels", "image": "https://cdn.example.com/heels.jpg" }),
    )
    .await;
    let id = product["id"].as_str().expect("id");
    let cookie = session_cookie();

    let (status, json) = send(
        &app,
        request(
            "POST",
            &format!("/api/v1/publish/{id}/channels"),
            Some(cookie.as_str()),
            Some(json!({ "channels": ["website", "facebook"] })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["data"]["channels"]["website"]["status"], "published");
    assert_eq!(json["data"]["channels"]["facebook"]["status"], "disabled");
    assert_eq!(json["data"]["product"]["visibility"], "published");
    assert_eq!(
        store.products().await[0].visibility,
        storefront_core::Visibility::Published
    );
}

#[tokio::test]
async fn publish_website_sets_visibility() {
    let (app, _store) = app();
    let product = create_product(&app, json!({ "name": "Tote" })).await;
    let id = product["id"].as_str().expect("id");
    let cookie = session_cookie();

    let (status, json) = send(
        &app,
        request("POST", &format!("/api/v1/publish/{id}"), Some(cookie.as_str()), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["visibility"], "published");
}

#[tokio::test]
async fn social_publish_without_image_is_rejected() {
    let (app, _store) = app();
    let cookie = session_cookie();
    let (status, json) = send(
        &app,
        request(
            "POST",
            "/api/v1/social/publish",
            Some(cookie.as_str()),
            Some(json!({ "product": { "name": "Red Heels" } })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
}

#[tokio::test]
async fn social_publish_defaults_to_every_platform() {
    let (app, _store) = app();
    let cookie = session_cookie();
    let (status, json) = send(
        &app,
        request(
            "POST",
            "/api/v1/social/publish",
            Some(cookie.as_str()),
            Some(json!({
                "product": { "name": "Red Heels", "image": "https://cdn.example.com/heels.jpg" }
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["results"]["facebook"]["status"], "disabled");
    assert_eq!(json["data"]["results"]["instagram"]["status"], "disabled");
}

#[tokio::test]
async fn social_publish_coerces_unknown_offer_and_status() {
    let (app, _store) = app();
    let cookie = session_cookie();
    let (status, json) = send(
        &app,
        request(
            "POST",
            "/api/v1/social/publish",
            Some(cookie.as_str()),
            Some(json!({
                "product": {
                    "name": "Red Heels",
                    "image": "https://cdn.example.com/heels.jpg",
                    "offer_percent": 40,
                    "stock_status": ""
                }
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["data"]["results"]["facebook"]["status"], "disabled");
}

#[tokio::test]
async fn login_sets_session_cookie() {
    let (app, _store) = app();
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/admin/login",
            None,
            Some(json!({ "password": PASSWORD })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .expect("set-cookie")
        .to_string();
    assert!(cookie.starts_with("admin_token="));
    assert!(cookie.contains("HttpOnly"));

    let session = cookie.split(';').next().expect("cookie pair");
    let (status, json) = send(&app, request("GET", "/api/v1/admin/me", Some(session), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["authenticated"], true);
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let (app, _store) = app();
    let (status, json) = send(
        &app,
        request(
            "POST",
            "/api/v1/admin/login",
            None,
            Some(json!({ "password": "guess" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"]["code"], "unauthorized");
}

#[tokio::test]
async fn logout_expires_cookie() {
    let (app, _store) = app();
    let response = app
        .oneshot(request("POST", "/api/v1/admin/logout", None, None))
        .await
        .expect("response");
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .expect("set-cookie");
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn me_without_cookie_is_anonymous() {
    let (app, _store) = app();
    let (status, json) = send(&app, request("GET", "/api/v1/admin/me", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["authenticated"], false);
}

#[tokio::test]
async fn upload_sign_returns_signed_params() {
    let (app, _store) = app();
    let cookie = session_cookie();
    let (status, json) = send(&app, request("POST", "/api/v1/upload/sign", Some(cookie.as_str()), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["cloud_name"], "demo");
    assert_eq!(json["data"]["upload_preset"], "storefront_unsigned");
    assert_eq!(json["data"]["signature"].as_str().map(str::len), Some(64));
}

#[tokio::test]
async fn enquiry_builds_whatsapp_link() {
    let (app, _store) = app();
    let product = create_product(
        &app,
        json!({ "name": "Red Heels", "slug": "red-heels", "price": 2500, "visibility": "published" }),
    )
    .await;
    assert_eq!(product["slug"], "red-heels");

    let (status, json) = send(
        &app,
        request(
            "POST",
            "/api/v1/enquiry",
            None,
            Some(json!({ "items": [{ "slug": "red-heels", "qty": 2 }] })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    let url = json["data"]["url"].as_str().expect("url");
    assert!(url.starts_with("https://wa.me/254700000000?text="));
    assert!(json["data"]["message"]
        .as_str()
        .expect("message")
        .contains("https://shop.example.com/p/red-heels"));
}

#[tokio::test]
async fn enquiry_with_no_items_is_rejected() {
    let (app, _store) = app();
    let (status, _json) = send(
        &app,
        request("POST", "/api/v1/enquiry", None, Some(json!({ "items": [] }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admin_routes_are_rate_limited() {
    let store = Arc::new(MemoryStore::new());
    let app = build_app(
        state(store),
        RateLimitState::new(1, Duration::from_secs(60)),
        default_login_rate_limit_state(),
    );
    let cookie = session_cookie();

    let (first, _json) = send(&app, request("POST", "/api/v1/upload/sign", Some(cookie.as_str()), None)).await;
    assert_eq!(first, StatusCode::OK);

    let (second, json) = send(&app, request("POST", "/api/v1/upload/sign", Some(cookie.as_str()), None)).await;
    assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["error"]["code"], "rate_limited");

    // Public reads are not counted.
    let (status, _json) = send(&app, request("GET", "/api/v1/products", None, None)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn failed_logins_do_not_consume_admin_budget() {
    let store = Arc::new(MemoryStore::new());
    let app = build_app(
        state(store),
        RateLimitState::new(5, Duration::from_secs(60)),
        RateLimitState::new(5, Duration::from_secs(60)),
    );
    let wrong = || {
        request(
            "POST",
            "/api/v1/admin/login",
            None,
            Some(json!({ "password": "guess" })),
        )
    };

    for _ in 0..5 {
        let (status, _json) = send(&app, wrong()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let cookie = session_cookie();
    let (status, _json) = send(
        &app,
        request(
            "POST",
            "/api/v1/products",
            Some(cookie.as_str()),
            Some(json!({ "name": "Bag" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, json) = send(&app, wrong()).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["error"]["code"], "rate_limited");
}
