//! Pipeline definition loading.
//!
//! Definitions are YAML files that may contain `${ENV_VAR}` placeholders, so
//! per-environment paths stay out of committed pipeline files. Placeholders
//! are expanded from the process environment before deserialization; an
//! unset variable fails the load rather than leaking an empty path into the
//! run.

use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::{Captures, Regex};

use crate::config::types::PipelineConfig;

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid placeholder regex")
});

/// Expand `${VAR}` placeholders from the process environment.
///
/// # Errors
///
/// Returns an error naming every placeholder with no matching environment
/// variable, each reported once.
pub fn substitute_env_vars(input: &str) -> Result<String> {
    let mut missing: Vec<String> = Vec::new();
    let expanded = PLACEHOLDER_RE.replace_all(input, |caps: &Captures<'_>| {
        let name = &caps[1];
        match std::env::var(name) {
            Ok(value) => value,
            Err(_) => {
                if !missing.iter().any(|m| m == name) {
                    missing.push(name.to_string());
                }
                String::new()
            }
        }
    });

    if !missing.is_empty() {
        anyhow::bail!(
            "pipeline references unset environment variable(s): {}",
            missing.join(", ")
        );
    }

    Ok(expanded.into_owned())
}

/// Parse a pipeline definition from YAML text.
///
/// # Errors
///
/// Returns an error if placeholder expansion fails or the YAML does not
/// describe a valid [`PipelineConfig`].
pub fn parse_pipeline_str(yaml_str: &str) -> Result<PipelineConfig> {
    let expanded = substitute_env_vars(yaml_str)?;
    serde_yaml::from_str(&expanded).context("Invalid pipeline YAML")
}

/// Load a pipeline definition from disk.
///
/// # Errors
///
/// Returns an error naming the definition file if it cannot be read or does
/// not parse.
pub fn parse_pipeline(path: &Path) -> Result<PipelineConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read pipeline definition: {}", path.display()))?;
    parse_pipeline_str(&text)
        .with_context(|| format!("Invalid pipeline definition: {}", path.display()))
}
