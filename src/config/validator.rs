//! Semantic validation for parsed pipeline configuration values.

use anyhow::{bail, Result};

use crate::config::types::{PipelineConfig, RecordErrorPolicy};

/// Validate a parsed pipeline configuration.
///
/// # Errors
///
/// Returns an error listing all validation failures found in the config.
pub fn validate_pipeline(config: &PipelineConfig) -> Result<()> {
    let mut errors = Vec::new();

    if config.version != "1.0" {
        errors.push(format!(
            "Unsupported pipeline version '{}', expected '1.0'",
            config.version
        ));
    }

    if config.pipeline.trim().is_empty() {
        errors.push("Pipeline name must not be empty".to_string());
    }

    if config.source.path.as_os_str().is_empty() {
        errors.push("Source path must not be empty".to_string());
    }

    if config.source.page_size == 0 {
        errors.push("source.page_size must be at least 1".to_string());
    }

    if config.destination.path.as_os_str().is_empty() {
        errors.push("Destination path must not be empty".to_string());
    }

    if config.on_record_error == RecordErrorPolicy::Dlq && config.dlq_path.is_none() {
        errors.push("on_record_error 'dlq' requires a dlq_path".to_string());
    }

    if config.resources.parallelism == 0 {
        errors.push("resources.parallelism must be at least 1".to_string());
    }

    if config.resources.batch_size == 0 {
        errors.push("resources.batch_size must be at least 1".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        bail!("Pipeline validation failed:\n  - {}", errors.join("\n  - "))
    }
}
