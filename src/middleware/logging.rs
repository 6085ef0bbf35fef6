//! Logging middleware
//!
//! Wraps every HTTP request in an `http.request` span carrying a request id,
//! and logs the outcome with its latency.

use std::time::Instant;
use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use tracing::{info, warn, Instrument};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Reuse a sane inbound request id, otherwise mint one
pub fn request_id(inbound: Option<&HeaderValue>) -> String {
    inbound
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty() && v.len() <= 128 && v.chars().all(|c| c.is_ascii_graphic()))
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

pub async fn request_tracing_middleware(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let request_id = request_id(request.headers().get(REQUEST_ID_HEADER));

    let span = tracing::info_span!(
        "http.request",
        request_id = %request_id,
        method = %method,
        path = %path,
        church_id = tracing::field::Empty,
    );

    let started = Instant::now();
    let mut response = next.run(request).instrument(span.clone()).await;
    let latency_ms = started.elapsed().as_millis() as u64;
    let status = response.status().as_u16();

    span.in_scope(|| {
        if response.status().is_server_error() {
            warn!(status = status, latency_ms = latency_ms, "Request completed with server error");
        } else {
            info!(status = status, latency_ms = latency_ms, "Request completed");
        }
    });

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_reuses_inbound() {
        let inbound = HeaderValue::from_static("abc-123");
        assert_eq!(request_id(Some(&inbound)), "abc-123");
    }

    #[test]
    fn test_request_id_generated_when_missing_or_odd() {
        let generated = request_id(None);
        assert!(uuid::Uuid::parse_str(&generated).is_ok());

        let spaced = HeaderValue::from_static("has spaces inside");
        assert_ne!(request_id(Some(&spaced)), "has spaces inside");
    }
}
