//! # Unified Application Configuration
//!
//! This module consolidates all application settings into a single, structured
//! configuration object loaded from environment variables and validated once
//! at startup.

use crate::errors::{error_logging, AppError, AppResult};
use crate::observability_config::ObservabilityConfig;
use crate::search::SearchConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Default location of the recipe corpus
pub const DEFAULT_RECIPES_PATH: &str = "data/recipes.json";

/// Ingredient parser settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Optional JSON unit vocabulary replacing the built-in one
    pub unit_vocabulary_path: Option<String>,
}

impl ParserConfig {
    /// Validate parser configuration
    pub fn validate(&self) -> AppResult<()> {
        if let Some(path) = &self.unit_vocabulary_path {
            if path.trim().is_empty() {
                return Err(AppError::Config(
                    "UNIT_VOCABULARY_PATH cannot be empty when set".to_string(),
                ));
            }
            if !Path::new(path).is_file() {
                return Err(AppError::Config(format!(
                    "Unit vocabulary file '{}' does not exist",
                    path
                )));
            }
        }
        Ok(())
    }
}

/// Recipe repository settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// JSON file holding the recipe corpus
    pub recipes_path: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            recipes_path: DEFAULT_RECIPES_PATH.to_string(),
        }
    }
}

impl RepositoryConfig {
    /// Validate repository configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.recipes_path.trim().is_empty() {
            return Err(AppError::Config("Recipes path cannot be empty".to_string()));
        }
        if !self.recipes_path.ends_with(".json") {
            return Err(AppError::Config(format!(
                "Recipes path '{}' must point to a .json file",
                self.recipes_path
            )));
        }
        Ok(())
    }
}

/// Unified application configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppConfig {
    /// Search limits
    pub search: SearchConfig,
    /// Ingredient parser configuration
    pub parser: ParserConfig,
    /// Recipe repository configuration
    pub repository: RepositoryConfig,
    /// Observability configuration
    pub observability: ObservabilityConfig,
}

fn parse_usize_var(name: &str, default: usize) -> AppResult<usize> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|e| {
                error_logging::log_config_error(&e, name, "parse_env");
                AppError::Config(format!("{} must be a valid number", name))
            }),
        Err(_) => Ok(default),
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        let mut config = Self::default();

        config.search.max_results =
            parse_usize_var("SEARCH_MAX_RESULTS", config.search.max_results)?;
        config.search.browse_sample_size =
            parse_usize_var("SEARCH_BROWSE_SAMPLE_SIZE", config.search.browse_sample_size)?;

        config.parser.unit_vocabulary_path = env::var("UNIT_VOCABULARY_PATH").ok();

        if let Ok(path) = env::var("RECIPES_PATH") {
            config.repository.recipes_path = path;
        }

        config.observability = ObservabilityConfig::from_env();

        Ok(config)
    }

    /// Validate all configuration sections
    pub fn validate(&self) -> AppResult<()> {
        self.search.validate()?;
        self.parser.validate()?;
        self.repository.validate()?;
        self.observability.validate().map_err(AppError::Config)?;
        Ok(())
    }

    /// Get a summary of the current configuration for logging
    pub fn summary(&self) -> String {
        format!(
            "Configuration: recipes_path={}, unit_vocabulary={}, max_results={}, browse_sample_size={}, environment={}, metrics_enabled={}",
            self.repository.recipes_path,
            self.parser
                .unit_vocabulary_path
                .as_deref()
                .unwrap_or("builtin"),
            self.search.max_results,
            self.search.browse_sample_size,
            self.observability.environment,
            self.observability.enable_metrics
        )
    }
}
