//! Observability module for logging and metrics setup.
//!
//! This module provides:
//! - Structured logging with configurable levels and formats
//! - An optional Prometheus recorder for the engine metrics
//! - `record_*` helpers used by the search and aggregation engines

use anyhow::Result;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::prelude::*;

pub use crate::observability_config::ObservabilityConfig;

/// Initialize structured logging with tracing and configuration
pub fn init_tracing(config: &ObservabilityConfig) -> Result<()> {
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid observability configuration: {}", e))?;

    // RUST_LOG directives first, then the crate's own level
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("just_recipes={}", config.log_level).parse()?);

    if config.use_pretty_logs() {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    }

    tracing::info!(
        environment = %config.environment,
        log_level = %config.log_level,
        log_format = %config.log_format,
        "Tracing initialized with structured logging"
    );
    Ok(())
}

/// Install a Prometheus recorder as the global metrics recorder
pub fn install_metrics_recorder(config: &ObservabilityConfig) -> Result<PrometheusHandle> {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();
    metrics::set_global_recorder(recorder)
        .map_err(|e| anyhow::anyhow!("Failed to install metrics recorder: {}", e))?;

    tracing::info!(
        environment = %config.environment,
        "Metrics collection initialized"
    );
    Ok(handle)
}

/// Create a span for engine operations
pub fn engine_span(operation: &str) -> tracing::Span {
    tracing::info_span!("engine_operation", operation = operation, component = "engine")
}

/// Record recipe search metrics
pub fn record_search_metrics(
    mode: &str,
    duration: std::time::Duration,
    terms: usize,
    candidates: usize,
    results: usize,
) {
    let mode = mode.to_string();
    metrics::counter!("recipe_search_operations_total", "mode" => mode.clone()).increment(1);
    metrics::histogram!("recipe_search_duration_seconds", "mode" => mode.clone())
        .record(duration.as_secs_f64());
    metrics::histogram!("recipe_search_terms").record(terms as f64);
    metrics::histogram!("recipe_search_candidates", "mode" => mode.clone())
        .record(candidates as f64);
    metrics::histogram!("recipe_search_results", "mode" => mode.clone()).record(results as f64);

    if results == 0 {
        metrics::counter!("recipe_search_empty_total", "mode" => mode).increment(1);
    }
}

/// Record shopping-list aggregation metrics
pub fn record_aggregation_metrics(
    duration: std::time::Duration,
    recipes: usize,
    clauses: usize,
    items: usize,
) {
    metrics::counter!("shopping_list_aggregations_total").increment(1);
    metrics::histogram!("shopping_list_duration_seconds").record(duration.as_secs_f64());
    metrics::histogram!("shopping_list_recipes").record(recipes as f64);
    metrics::histogram!("shopping_list_clauses").record(clauses as f64);
    metrics::histogram!("shopping_list_items").record(items as f64);

    // Fraction of parsed clauses merged into an existing line
    if clauses > 0 {
        let merged = clauses.saturating_sub(items) as f64 / clauses as f64;
        metrics::histogram!("shopping_list_merge_ratio").record(merged);
    }
}
