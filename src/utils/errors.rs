//! Error handling for Shepherd
//!
//! This module defines the main error type used throughout the application
//! and how each kind of failure is reported over HTTP.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::{error, info, warn};

/// Main error type for Shepherd application
#[derive(Error, Debug)]
pub enum ShepherdError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration loading error: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Authentication required: {0}")]
    Unauthorized(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    #[error("{0}")]
    Unrecognized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Feature '{feature}' is not included in the {plan} plan")]
    FeatureUnavailable { feature: String, plan: String },

    #[error("Subscription inactive: {0}")]
    SubscriptionInactive(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Shepherd operations
pub type Result<T> = std::result::Result<T, ShepherdError>;

impl ShepherdError {
    /// Shorthand for a missing row
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        ShepherdError::NotFound { entity, id }
    }

    /// Turn unique-constraint violations into a conflict with the given message
    pub fn on_unique_violation(err: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return ShepherdError::Conflict(message.to_string());
            }
        }
        ShepherdError::Database(err)
    }

    /// HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ShepherdError::Validation(_) => StatusCode::BAD_REQUEST,
            ShepherdError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ShepherdError::Token(_) => StatusCode::UNAUTHORIZED,
            ShepherdError::SubscriptionInactive(_) => StatusCode::PAYMENT_REQUIRED,
            ShepherdError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            ShepherdError::FeatureUnavailable { .. } => StatusCode::FORBIDDEN,
            ShepherdError::NotFound { .. } | ShepherdError::Unrecognized(_) => StatusCode::NOT_FOUND,
            ShepherdError::Conflict(_) => StatusCode::CONFLICT,
            ShepherdError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            ShepherdError::Validation(_) => "validation_error",
            ShepherdError::Unauthorized(_) | ShepherdError::Token(_) => "unauthorized",
            ShepherdError::SubscriptionInactive(_) => "subscription_inactive",
            ShepherdError::PermissionDenied(_) => "forbidden",
            ShepherdError::FeatureUnavailable { .. } => "feature_unavailable",
            ShepherdError::NotFound { .. } | ShepherdError::Unrecognized(_) => "not_found",
            ShepherdError::Conflict(_) => "conflict",
            ShepherdError::RateLimitExceeded => "rate_limited",
            _ => "internal_error",
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ShepherdError::Database(_) => ErrorSeverity::Critical,
            ShepherdError::Migration(_) => ErrorSeverity::Critical,
            ShepherdError::Config(_) => ErrorSeverity::Critical,
            ShepherdError::ConfigLoad(_) => ErrorSeverity::Critical,
            ShepherdError::PermissionDenied(_) => ErrorSeverity::Warning,
            ShepherdError::Unauthorized(_) => ErrorSeverity::Warning,
            ShepherdError::Token(_) => ErrorSeverity::Warning,
            ShepherdError::RateLimitExceeded => ErrorSeverity::Warning,
            ShepherdError::Validation(_) => ErrorSeverity::Info,
            ShepherdError::NotFound { .. } | ShepherdError::Unrecognized(_) => ErrorSeverity::Info,
            ShepherdError::Conflict(_) => ErrorSeverity::Info,
            ShepherdError::FeatureUnavailable { .. } => ErrorSeverity::Info,
            ShepherdError::SubscriptionInactive(_) => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }

    /// Message safe to show to API clients
    pub fn public_message(&self) -> String {
        if self.status_code().is_server_error() {
            "An unexpected error occurred".to_string()
        } else {
            match self {
                ShepherdError::Token(_) => "Invalid or expired token".to_string(),
                other => other.to_string(),
            }
        }
    }
}

impl IntoResponse for ShepherdError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match self.severity() {
            ErrorSeverity::Critical | ErrorSeverity::Error => {
                error!(error = %self, status = status.as_u16(), "Request failed");
            }
            ErrorSeverity::Warning => {
                warn!(error = %self, status = status.as_u16(), "Request rejected");
            }
            ErrorSeverity::Info => {
                info!(error = %self, status = status.as_u16(), "Request rejected");
            }
        }

        let body = Json(serde_json::json!({
            "error": self.code(),
            "message": self.public_message(),
        }));

        (status, body).into_response()
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ShepherdError::Validation("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ShepherdError::Unauthorized("x".into()).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ShepherdError::PermissionDenied("x".into()).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ShepherdError::not_found("Member", 7).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ShepherdError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ShepherdError::SubscriptionInactive("trial ended".into()).status_code(),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(ShepherdError::RateLimitExceeded.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(ShepherdError::Internal("boom".into()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_server_errors_hide_details() {
        let err = ShepherdError::Internal("connection string leaked".into());
        assert_eq!(err.public_message(), "An unexpected error occurred");

        let err = ShepherdError::not_found("Member", 42);
        assert_eq!(err.public_message(), "Member not found: 42");
    }

    #[test]
    fn test_severity() {
        assert_eq!(ShepherdError::Config("x".into()).severity(), ErrorSeverity::Critical);
        assert_eq!(ShepherdError::RateLimitExceeded.severity(), ErrorSeverity::Warning);
        assert_eq!(ShepherdError::Validation("x".into()).severity(), ErrorSeverity::Info);
        assert_eq!(ErrorSeverity::Warning.to_string(), "WARN");
    }

    #[test]
    fn test_non_database_errors_pass_through_unique_check() {
        let err = ShepherdError::on_unique_violation(sqlx::Error::RowNotFound, "duplicate");
        assert!(matches!(err, ShepherdError::Database(sqlx::Error::RowNotFound)));
    }

    #[tokio::test]
    async fn test_into_response_body() {
        let response = ShepherdError::Conflict("Member already checked in".into()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "conflict");
        assert_eq!(body["message"], "Conflict: Member already checked in");
    }
}
