//! Liveness and readiness probes

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use tracing::warn;
use crate::database::connection::health_check;
use crate::state::AppState;

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "name": crate::NAME,
        "version": crate::VERSION,
    }))
}

/// Ready once the database answers
pub async fn ready(State(state): State<AppState>) -> Response {
    match health_check(state.db.pool()).await {
        Ok(()) => Json(json!({ "status": "ready" })).into_response(),
        Err(e) => {
            warn!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable" })),
            )
                .into_response()
        }
    }
}
