//! # Observability Configuration
//!
//! Environment-specific settings for logging and metrics.

use std::env;

/// Accepted `LOG_FORMAT` values
pub const LOG_FORMATS: [&str; 2] = ["pretty", "json"];
/// Accepted `LOG_LEVEL` values
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Observability configuration for different environments
#[derive(Debug, Clone, PartialEq)]
pub struct ObservabilityConfig {
    /// Environment name (development, staging, production)
    pub environment: String,
    /// Log level for the crate's own targets
    pub log_level: String,
    /// `pretty` or `json`; development always logs pretty
    pub log_format: String,
    /// Whether a Prometheus recorder is installed
    pub enable_metrics: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            log_level: "info".to_string(),
            log_format: "json".to_string(),
            enable_metrics: false,
        }
    }
}

impl ObservabilityConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            log_level: env::var("LOG_LEVEL")
                .map(|level| level.to_lowercase())
                .unwrap_or_else(|_| "info".to_string()),
            log_format: env::var("LOG_FORMAT")
                .map(|format| format.to_lowercase())
                .unwrap_or_else(|_| "json".to_string()),
            enable_metrics: env::var("ENABLE_METRICS")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
        }
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Check if running in development environment
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Pretty console output instead of JSON lines
    pub fn use_pretty_logs(&self) -> bool {
        self.is_development() || self.log_format == "pretty"
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.environment.trim().is_empty() {
            return Err("Environment name cannot be empty".to_string());
        }

        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(format!("Invalid log level: {}", self.log_level));
        }

        if !LOG_FORMATS.contains(&self.log_format.as_str()) {
            return Err(format!("Invalid log format: {}", self.log_format));
        }

        Ok(())
    }
}

/// Environment-specific configuration presets
pub mod presets {
    use super::ObservabilityConfig;

    /// Development configuration with verbose pretty logs
    pub fn development() -> ObservabilityConfig {
        ObservabilityConfig {
            environment: "development".to_string(),
            log_level: "debug".to_string(),
            log_format: "pretty".to_string(),
            ..Default::default()
        }
    }

    /// Production configuration: JSON logs and metrics
    pub fn production() -> ObservabilityConfig {
        ObservabilityConfig {
            environment: "production".to_string(),
            log_level: "warn".to_string(),
            log_format: "json".to_string(),
            enable_metrics: true,
        }
    }
}
