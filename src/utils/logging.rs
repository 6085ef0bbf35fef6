//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the Shepherd application.

use tracing::{info, warn, debug};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};
use crate::config::LoggingConfig;
use crate::utils::errors::{ShepherdError, Result};

/// Initialize logging based on configuration.
///
/// The returned guard flushes the file writer on drop and must be held for the
/// lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level));

    let stdout_layer = if config.json {
        tracing_subscriber::fmt::layer().json().with_writer(std::io::stdout).boxed()
    } else {
        tracing_subscriber::fmt::layer().with_writer(std::io::stdout).boxed()
    };

    let (file_layer, guard) = if config.directory.is_empty() {
        (None, None)
    } else {
        let file_appender = tracing_appender::rolling::daily(&config.directory, "shepherd.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_ansi(false)
            .with_writer(non_blocking)
            .boxed();
        (Some(layer), Some(guard))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| ShepherdError::Config(format!("Failed to initialize logging: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log authentication attempts
pub fn log_auth_event(email: &str, action: &str, success: bool, details: Option<&str>) {
    if success {
        info!(
            email = email,
            action = action,
            details = details,
            "Authentication event: success"
        );
    } else {
        warn!(
            email = email,
            action = action,
            details = details,
            "Authentication event: failure"
        );
    }
}

/// Log a recorded check-in
pub fn log_check_in(church_id: i64, member_id: i64, event_id: Option<i64>, method: &str) {
    info!(
        church_id = church_id,
        member_id = member_id,
        event_id = event_id,
        method = method,
        "Attendance recorded"
    );
}

/// Log changes made by church staff
pub fn log_tenant_action(church_id: i64, user_id: i64, action: &str, target: Option<i64>) {
    info!(
        church_id = church_id,
        user_id = user_id,
        action = action,
        target = target,
        "Tenant action performed"
    );
}

/// Log super admin actions
pub fn log_admin_action(admin_id: i64, action: &str, target: Option<&str>, details: Option<&str>) {
    warn!(
        admin_id = admin_id,
        action = action,
        target = target,
        details = details,
        "Admin action performed"
    );
}

/// Log CSV exports
pub fn log_export(church_id: i64, user_id: i64, export: &str, rows: usize) {
    debug!(
        church_id = church_id,
        user_id = user_id,
        export = export,
        rows = rows,
        "CSV export generated"
    );
}
