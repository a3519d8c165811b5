use std::path::Path;

use anyhow::{Context, Result};

use postdump::config::{parser, validator};
use postdump::engine::check_pipeline;
use postdump::error::{ValidationResult, ValidationStatus};
use postdump::sink::open_sink;
use postdump::source::open_source;

/// Execute the `check` command: validate pipeline config and connectivity.
pub async fn execute(pipeline_path: &Path) -> Result<()> {
    let config = parser::parse_pipeline(pipeline_path)
        .with_context(|| format!("Failed to parse pipeline: {}", pipeline_path.display()))?;

    validator::validate_pipeline(&config)?;
    println!("Pipeline structure: OK");

    let source = open_source(&config.source.path);
    let sink = open_sink(&config.destination.path);
    let result = check_pipeline(source.as_ref(), sink.as_ref());

    print_validation("Source", &result.source_validation);
    print_validation("Destination", &result.destination_validation);

    if result.all_ok() {
        println!("\nAll checks passed.");
        Ok(())
    } else {
        anyhow::bail!("One or more checks failed")
    }
}

fn print_validation(label: &str, result: &ValidationResult) {
    let status = match result.status {
        ValidationStatus::Success => "OK",
        ValidationStatus::Failed => "FAILED",
    };
    println!("{:14} {}", format!("{label}:"), status);
    if !result.message.is_empty() {
        println!("  {}", result.message);
    }
}
