//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use std::path::Path;
use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub billing: BillingConfig,
    pub checkin: CheckInConfig,
    pub bootstrap_admin: Option<BootstrapAdminConfig>,
    pub logging: LoggingConfig,
    pub features: FeaturesConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Base URL the public check-in pages are served from
    pub public_base_url: String,
    pub cors_origins: Vec<String>,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub password_iterations: u32,
}

/// Subscription configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BillingConfig {
    pub trial_days: i64,
}

/// Public check-in link configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CheckInConfig {
    /// Failed PIN attempts allowed per link and client address
    pub pin_attempts_per_minute: u32,
    /// Failed PIN attempts allowed per link across all clients
    pub link_failures_per_minute: u32,
    /// Seconds a link or client stays locked once its quota is spent
    pub lockout_seconds: u64,
    pub min_pin_length: usize,
}

/// Super admin seeded on first start
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BootstrapAdminConfig {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    /// Directory for daily rolling log files; empty disables file output
    pub directory: String,
    pub json: bool,
}

/// Feature flags configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeaturesConfig {
    pub open_registration: bool,
    pub seed_super_admin: bool,
}

impl Settings {
    /// Load settings from defaults, `config.toml` and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        Self::builder(config::File::with_name("config").required(false))?
            .build()?
            .try_deserialize()
    }

    /// Load settings from a specific file, still honouring environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, config::ConfigError> {
        Self::builder(config::File::from(path.as_ref()).required(true))?
            .build()?
            .try_deserialize()
    }

    fn builder(
        file: config::File<config::FileSourceFile, config::FileFormat>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
        let defaults = config::Config::try_from(&Settings::default())?;

        Ok(config::Config::builder()
            .add_source(defaults)
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("SHEPHERD")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins")
                    .try_parsing(true),
            ))
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::ShepherdError> {
        super::validation::validate_settings(self)
    }

    /// Address the HTTP listener binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                public_base_url: "http://localhost:8080".to_string(),
                cors_origins: vec![],
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/shepherd".to_string(),
                max_connections: 10,
                min_connections: 1,
                acquire_timeout_seconds: 30,
            },
            auth: AuthConfig {
                jwt_secret: String::new(),
                token_ttl_hours: 12,
                password_iterations: 100_000,
            },
            billing: BillingConfig {
                trial_days: 14,
            },
            checkin: CheckInConfig {
                pin_attempts_per_minute: 10,
                link_failures_per_minute: 100,
                lockout_seconds: 60,
                min_pin_length: 4,
            },
            bootstrap_admin: None,
            logging: LoggingConfig {
                level: "info".to_string(),
                directory: String::new(),
                json: false,
            },
            features: FeaturesConfig {
                open_registration: true,
                seed_super_admin: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_settings_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9090

[billing]
trial_days = 30

[bootstrap_admin]
email = "root@example.org"
password = "super-secret-password"
full_name = "Platform Owner"
"#
        )
        .unwrap();

        let settings = Settings::from_file(file.path()).unwrap();
        assert_eq!(settings.server.port, 9090);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.billing.trial_days, 30);
        assert_eq!(settings.auth.token_ttl_hours, 12);
        assert_eq!(settings.bootstrap_admin.unwrap().email, "root@example.org");
    }

    #[test]
    fn test_bind_address() {
        let settings = Settings::default();
        assert_eq!(settings.bind_address(), "0.0.0.0:8080");
    }
}
