//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{ShepherdError, Result};
use super::Settings;

const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_server_config(&settings.server)?;
    validate_database_config(&settings.database)?;
    validate_auth_config(&settings.auth)?;
    validate_billing_config(&settings.billing)?;
    validate_checkin_config(&settings.checkin)?;
    validate_logging_config(&settings.logging)?;

    if let Some(ref admin) = settings.bootstrap_admin {
        validate_bootstrap_admin(admin)?;
    }

    Ok(())
}

/// Validate server configuration
fn validate_server_config(config: &super::ServerConfig) -> Result<()> {
    if config.port == 0 {
        return Err(ShepherdError::Config(
            "Server port must be greater than 0".to_string()
        ));
    }

    let base = url::Url::parse(&config.public_base_url)?;
    if !matches!(base.scheme(), "http" | "https") {
        return Err(ShepherdError::Config(
            format!("Public base URL must be http(s): {}", config.public_base_url)
        ));
    }

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(ShepherdError::Config(
            "Database URL is required".to_string()
        ));
    }

    if config.max_connections == 0 {
        return Err(ShepherdError::Config(
            "Max connections must be greater than 0".to_string()
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(ShepherdError::Config(
            "Min connections cannot be greater than max connections".to_string()
        ));
    }

    Ok(())
}

/// Validate authentication configuration
fn validate_auth_config(config: &super::AuthConfig) -> Result<()> {
    if config.jwt_secret.trim().is_empty() {
        return Err(ShepherdError::Config(
            "JWT secret is not set (SHEPHERD__AUTH__JWT_SECRET)".to_string()
        ));
    }

    if config.jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ShepherdError::Config(
            format!("JWT secret must be at least {} bytes", MIN_JWT_SECRET_LENGTH)
        ));
    }

    if config.token_ttl_hours <= 0 {
        return Err(ShepherdError::Config(
            "Token TTL must be greater than 0".to_string()
        ));
    }

    if config.password_iterations == 0 {
        return Err(ShepherdError::Config(
            "Password iterations must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate subscription configuration
fn validate_billing_config(config: &super::BillingConfig) -> Result<()> {
    if config.trial_days <= 0 {
        return Err(ShepherdError::Config(
            "Trial length must be greater than 0 days".to_string()
        ));
    }

    Ok(())
}

/// Validate check-in link configuration
fn validate_checkin_config(config: &super::CheckInConfig) -> Result<()> {
    if config.pin_attempts_per_minute == 0 {
        return Err(ShepherdError::Config(
            "PIN attempts per minute must be greater than 0".to_string()
        ));
    }

    if config.link_failures_per_minute < config.pin_attempts_per_minute {
        return Err(ShepherdError::Config(
            "Link failures per minute cannot be below PIN attempts per minute".to_string()
        ));
    }

    if config.min_pin_length < 4 {
        return Err(ShepherdError::Config(
            "Minimum PIN length must be at least 4".to_string()
        ));
    }

    Ok(())
}

/// Validate super admin seed
fn validate_bootstrap_admin(config: &super::BootstrapAdminConfig) -> Result<()> {
    if config.email.is_empty() || config.password.is_empty() || config.full_name.is_empty() {
        return Err(ShepherdError::Config(
            "Bootstrap admin requires email, password and full_name".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(ShepherdError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(ShepherdError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn configured() -> Settings {
        let mut settings = Settings::default();
        settings.auth.jwt_secret = "a-deployment-specific-secret-of-enough-length".to_string();
        settings
    }

    #[test]
    fn test_configured_defaults_are_valid() {
        assert!(validate_settings(&configured()).is_ok());
    }

    #[test]
    fn test_jwt_secret_must_be_configured() {
        let defaults = Settings::default();
        assert!(defaults.auth.jwt_secret.is_empty());
        assert_matches!(
            validate_settings(&defaults),
            Err(ShepherdError::Config(msg)) if msg.contains("JWT secret is not set")
        );

        let mut settings = configured();
        settings.auth.jwt_secret = "   ".to_string();
        assert_matches!(validate_settings(&settings), Err(ShepherdError::Config(_)));
    }

    #[test]
    fn test_short_jwt_secret_rejected() {
        let mut settings = configured();
        settings.auth.jwt_secret = "short".to_string();
        assert_matches!(validate_settings(&settings), Err(ShepherdError::Config(_)));
    }

    #[test]
    fn test_connection_bounds() {
        let mut settings = configured();
        settings.database.min_connections = 20;
        assert!(validate_settings(&settings).is_err());

        settings.database.min_connections = 0;
        settings.database.max_connections = 0;
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut settings = configured();
        settings.logging.level = "verbose".to_string();
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_public_base_url_must_be_http() {
        let mut settings = configured();
        settings.server.public_base_url = "not a url".to_string();
        assert_matches!(validate_settings(&settings), Err(ShepherdError::UrlParse(_)));

        settings.server.public_base_url = "ftp://files.example.org".to_string();
        assert_matches!(validate_settings(&settings), Err(ShepherdError::Config(_)));
    }

    #[test]
    fn test_incomplete_bootstrap_admin() {
        let mut settings = configured();
        settings.bootstrap_admin = Some(super::super::BootstrapAdminConfig {
            email: "root@example.org".to_string(),
            password: String::new(),
            full_name: "Root".to_string(),
        });
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_pin_policy() {
        let mut settings = configured();
        settings.checkin.min_pin_length = 3;
        assert!(validate_settings(&settings).is_err());

        let mut settings = configured();
        settings.checkin.pin_attempts_per_minute = 0;
        assert!(validate_settings(&settings).is_err());

        let mut settings = configured();
        settings.checkin.link_failures_per_minute = 5;
        assert!(validate_settings(&settings).is_err());
    }
}
