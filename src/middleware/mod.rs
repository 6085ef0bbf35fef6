//! Middleware module
//!
//! This module contains middleware for request processing

pub mod auth;
pub mod logging;
pub mod rate_limit;

// Re-export commonly used middleware
pub use auth::{ApiJson, ApiQuery, ChurchAuth, SuperAdminAuth};
pub use logging::request_tracing_middleware;
pub use rate_limit::RateLimitMiddleware;
