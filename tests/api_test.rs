//! HTTP surface tests that need no database
//!
//! The router runs over a lazily connected pool pointing at a closed port,
//! so only paths that fail before touching the database are exercised here.

mod helpers;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;
use helpers::*;
use shepherd::config::Settings;
use shepherd::database::{create_lazy_pool, DatabaseService};
use shepherd::models::{ChurchRole, PrincipalKind};
use shepherd::state::AppState;

fn offline_state(settings: Settings) -> AppState {
    let pool = create_lazy_pool(&settings.database).expect("Failed to create lazy pool");
    AppState::new(settings, DatabaseService::new(pool))
}

fn offline_app() -> (AppState, axum::Router) {
    let state = offline_state(test_settings());
    let app = shepherd::router(state.clone());
    (state, app)
}

fn church_token(state: &AppState) -> String {
    state
        .services
        .auth_service
        .issue_token(PrincipalKind::ChurchUser, 7, Some(3), Some(ChurchRole::Owner))
        .unwrap()
        .token
}

fn admin_token(state: &AppState) -> String {
    state
        .services
        .auth_service
        .issue_token(PrincipalKind::SuperAdmin, 1, None, None)
        .unwrap()
        .token
}

#[tokio::test]
async fn test_health_reports_version() {
    let (_, app) = offline_app();
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], shepherd::VERSION);
}

#[tokio::test]
async fn test_ready_fails_without_database() {
    let (_, app) = offline_app();
    let (status, body) = send(&app, Method::GET, "/ready", None, None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unavailable");
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let (_, app) = offline_app();
    for uri in ["/api/members", "/api/auth/me", "/api/subscription", "/api/admin/stats"] {
        let (status, body) = send(&app, Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(body["error"], "unauthorized");
    }
}

#[tokio::test]
async fn test_garbage_token_is_unauthorized() {
    let (_, app) = offline_app();
    let (status, body) = send(&app, Method::GET, "/api/members", Some("not.a.jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid or expired token");
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_rejected() {
    let (_, app) = offline_app();

    let mut other = test_settings();
    other.auth.jwt_secret = "a-completely-different-secret-value".to_string();
    let foreign = church_token(&offline_state(other));

    let (status, _) = send(&app, Method::GET, "/api/events", Some(&foreign), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let mut settings = test_settings();
    settings.auth.token_ttl_hours = -2;
    let state = offline_state(settings);
    let token = church_token(&state);
    let app = shepherd::router(state);

    let (status, _) = send(&app, Method::GET, "/api/members", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_principal_kind_is_forbidden() {
    let (state, app) = offline_app();

    let (status, body) = send(&app, Method::GET, "/api/members", Some(&admin_token(&state)), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, _) = send(&app, Method::GET, "/api/admin/churches", Some(&church_token(&state)), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_malformed_json_is_a_validation_error() {
    let (_, app) = offline_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"email\": "))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_payload_is_validated_before_lookup() {
    let (_, app) = offline_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "", "password": "" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("email is required"));
    assert!(message.contains("password is required"));
}

#[tokio::test]
async fn test_registration_closed() {
    let mut settings = test_settings();
    settings.features.open_registration = false;
    let app = shepherd::router(offline_state(settings));

    let payload = serde_json::to_value(registration_request()).unwrap();
    let (status, body) = send(&app, Method::POST, "/api/auth/register", None, Some(payload)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Permission denied: Registration is closed");
}

#[tokio::test]
async fn test_public_check_in_requires_pin() {
    let (_, app) = offline_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/public/checkin/grace-chapel",
        None,
        Some(json!({ "pin": "", "member_id": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("pin is required"));
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let (_, app) = offline_app();
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "trace-abc-123")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "trace-abc-123");

    let response = send_raw(&app, Method::GET, "/health", None, None).await;
    let generated = response.headers()["x-request-id"].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(generated).is_ok());
}

#[tokio::test]
async fn test_cors_preflight_for_configured_origin() {
    let (_, app) = offline_app();
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/auth/login")
        .header(header::ORIGIN, "https://app.example.org")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://app.example.org"
    );
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (_, app) = offline_app();
    let response = send_raw(&app, Method::GET, "/api/does-not-exist", None, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
