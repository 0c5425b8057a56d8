//! # Application Error Types
//!
//! This module defines the error types used at the edges of the JustRecipes crate:
//! configuration loading, recipe repositories and unit vocabulary files.
//! The matching and aggregation engines themselves are total and never return errors.

use std::fmt;

/// General application error type for consistent error handling
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Configuration validation errors
    Config(String),
    /// Validation errors (vocabulary entries, recipe records, inputs)
    Validation(String),
    /// Recipe repository errors
    Repository(String),
    /// File system errors
    FileSystem(String),
    /// JSON (de)serialization errors
    Serialization(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "[CONFIG] {}", msg),
            AppError::Validation(msg) => write!(f, "[VALIDATION] {}", msg),
            AppError::Repository(msg) => write!(f, "[REPOSITORY] {}", msg),
            AppError::FileSystem(msg) => write!(f, "[FILESYSTEM] {}", msg),
            AppError::Serialization(msg) => write!(f, "[SERIALIZATION] {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::FileSystem(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<regex::Error> for AppError {
    fn from(err: regex::Error) -> Self {
        AppError::Config(format!("invalid pattern: {}", err))
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Standardized error logging utilities for consistent error reporting across the crate
pub mod error_logging {
    use tracing::error;

    /// Log recipe repository errors with source context
    pub fn log_repository_error(
        error: &impl std::fmt::Display,
        operation: &str,
        source: Option<&str>,
        recipe_count: Option<usize>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            source = ?source,
            recipe_count = ?recipe_count,
            "Recipe repository operation failed"
        );
    }

    /// Log file system errors with path and operation context
    pub fn log_filesystem_error(
        error: &impl std::fmt::Display,
        operation: &str,
        path: Option<&str>,
        file_size: Option<u64>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            path = ?path,
            file_size_bytes = ?file_size,
            "File system operation failed"
        );
    }

    /// Log validation errors with input context
    pub fn log_validation_error(
        error: &impl std::fmt::Display,
        operation: &str,
        input_type: &str,
        input_value: Option<&str>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            input_type = %input_type,
            input_value = ?input_value.map(|v| if v.chars().count() > 100 { format!("{}...", v.chars().take(100).collect::<String>()) } else { v.to_string() }),
            "Validation failed"
        );
    }

    /// Log configuration errors during startup/initialization
    pub fn log_config_error(
        error: &impl std::fmt::Display,
        config_key: &str,
        operation: &str,
    ) {
        error!(
            error = %error,
            config_key = %config_key,
            operation = %operation,
            "Configuration error"
        );
    }
}
