//! Configuration parsing and validation for walksched
//!
//! Supports TOML configuration with:
//! - Versioned schema
//! - HTTP listen address and data directory
//! - Grace period and late-request lead for the scheduler
//! - Optional push delivery endpoint
//! - Validation with clear error messages

mod schema;
mod service;
mod validation;

pub use schema::*;
pub use service::*;
pub use validation::*;

use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<ValidationError> },

    #[error("Unsupported config version: {0}")]
    UnsupportedVersion(u32),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Load and validate configuration from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<ServiceConfig> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(content: &str) -> ConfigResult<ServiceConfig> {
    let raw: RawConfig = toml::from_str(content)?;

    if raw.config_version != CURRENT_CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion(raw.config_version));
    }

    let errors = validate_config(&raw);
    if !errors.is_empty() {
        return Err(ConfigError::ValidationFailed { errors });
    }

    Ok(ServiceConfig::from_raw(raw))
}

/// Current supported config version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Grace period between activation and expiry (5 minutes)
pub const DEFAULT_GRACE_PERIOD_SECS: u64 = 300;

/// Lead given to late requests (1 minute)
pub const DEFAULT_LATE_REQUEST_LEAD_SECS: u64 = 60;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn parse_minimal_config() {
        let config = r#"
            config_version = 1
        "#;

        let config = parse_config(config).unwrap();
        assert_eq!(config.schedule.grace_period, Duration::from_secs(300));
        assert_eq!(config.schedule.late_request_lead, Duration::from_secs(60));
        assert!(config.push.is_none());
    }

    #[test]
    fn parse_full_config() {
        let config = r#"
            config_version = 1

            [service]
            listen_addr = "0.0.0.0:9000"
            data_dir = "/var/lib/walksched"

            [schedule]
            grace_period_seconds = 600
            late_request_lead_seconds = 30

            [push]
            endpoint = "https://push.example.com/v1/send"
            api_key_env = "WALKSCHED_PUSH_KEY"
            timeout_seconds = 5
        "#;

        let config = parse_config(config).unwrap();
        assert_eq!(config.listen_addr.port(), 9000);
        assert_eq!(config.data_dir, std::path::PathBuf::from("/var/lib/walksched"));
        assert_eq!(config.schedule.grace_period, Duration::from_secs(600));
        assert_eq!(config.schedule.late_request_lead, Duration::from_secs(30));

        let push = config.push.unwrap();
        assert_eq!(push.endpoint, "https://push.example.com/v1/send");
        assert_eq!(push.timeout, Duration::from_secs(5));
    }

    #[test]
    fn reject_wrong_version() {
        let config = r#"
            config_version = 99
        "#;

        let result = parse_config(config);
        assert!(matches!(result, Err(ConfigError::UnsupportedVersion(99))));
    }

    #[test]
    fn reject_invalid_values() {
        let config = r#"
            config_version = 1

            [schedule]
            grace_period_seconds = 0
        "#;

        let result = parse_config(config);
        assert!(matches!(result, Err(ConfigError::ValidationFailed { .. })));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "config_version = 1").unwrap();
        writeln!(file, "[schedule]").unwrap();
        writeln!(file, "grace_period_seconds = 120").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.schedule.grace_period, Duration::from_secs(120));
    }

    #[test]
    fn missing_file_is_read_error() {
        let result = load_config("/nonexistent/walksched/config.toml");
        assert!(matches!(result, Err(ConfigError::ReadError(_))));
    }
}
