//! HTTP handlers module
//!
//! Handlers are grouped by resource; [`router`] wires them to their routes:
//! - `/health`, `/ready` probes
//! - `/api/...` authenticated church and super admin endpoints
//! - `/public/checkin/...` the PIN-protected self check-in page

pub mod admin;
pub mod attendance;
pub mod auth;
pub mod checkin;
pub mod church;
pub mod events;
pub mod health;
pub mod members;
pub mod reports;
pub mod subscription;
pub mod visitors;

use std::time::Duration;
use axum::http::header::{AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method};
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use crate::middleware::logging::{request_tracing_middleware, REQUEST_ID_HEADER};
use crate::state::AppState;

/// Build the CORS policy from configured origins; `*` allows any origin
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .expose_headers([CONTENT_DISPOSITION, HeaderName::from_static(REQUEST_ID_HEADER)])
        .max_age(Duration::from_secs(3600));

    if origins.iter().any(|o| o == "*") {
        layer.allow_origin(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| HeaderValue::from_str(o.trim()).ok())
            .collect();
        layer.allow_origin(AllowOrigin::list(allowed))
    }
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/church", get(church::get_church).put(church::update_church))
        .route("/users", get(church::list_users).post(church::create_user))
        .route("/users/:id", put(church::update_user).delete(church::delete_user))
        .route("/members", get(members::list_members).post(members::create_member))
        .route(
            "/members/:id",
            get(members::get_member).put(members::update_member).delete(members::delete_member),
        )
        .route(
            "/members/:id/biometric",
            post(members::enroll_biometric).delete(members::remove_biometric),
        )
        .route("/visitors", get(visitors::list_visitors).post(visitors::create_visitor))
        .route(
            "/visitors/:id",
            get(visitors::get_visitor).put(visitors::update_visitor).delete(visitors::delete_visitor),
        )
        .route("/visitors/:id/convert", post(visitors::convert_visitor))
        .route("/events", get(events::list_events).post(events::create_event))
        .route(
            "/events/:id",
            get(events::get_event).put(events::update_event).delete(events::delete_event),
        )
        .route(
            "/attendance",
            get(attendance::list_attendance).post(attendance::create_attendance),
        )
        .route("/attendance/biometric", post(attendance::biometric_check_in))
        .route("/attendance/:id", axum::routing::delete(attendance::delete_attendance))
        .route("/kiosk/search", get(attendance::kiosk_search))
        .route("/kiosk/checkin", post(attendance::kiosk_check_in))
        .route("/checkin-link", get(checkin::get_link).put(checkin::update_link))
        .route("/subscription", get(subscription::get_subscription))
        .route("/subscription/plan", post(subscription::change_plan))
        .route("/subscription/cancel", post(subscription::cancel))
        .route("/reports/dashboard", get(reports::dashboard))
        .route("/reports/attendance", get(reports::attendance_report))
        .route("/exports/members.csv", get(reports::export_members))
        .route("/exports/visitors.csv", get(reports::export_visitors))
        .route("/exports/attendance.csv", get(reports::export_attendance))
        .nest("/admin", admin_routes())
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(auth::admin_login))
        .route("/churches", get(admin::list_churches))
        .route("/churches/:id", get(admin::get_church))
        .route("/churches/:id/status", put(admin::set_church_status))
        .route("/churches/:id/subscription", put(admin::update_subscription))
        .route("/stats", get(admin::stats))
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/checkin/:slug", get(checkin::public_info).post(checkin::public_check_in))
        .route("/checkin/:slug/members", post(checkin::public_search))
}

/// Assemble the full application router
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.settings.server.cors_origins);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .nest("/api", api_routes())
        .nest("/public", public_routes())
        .layer(axum::middleware::from_fn(request_tracing_middleware))
        .layer(cors)
        .with_state(state)
}
