use std::path::Path;

use anyhow::{Context, Result};

use postdump::config::{parser, validator};
use postdump::engine::{run_pipeline, ExecutionOptions};
use postdump::sink::open_sink;
use postdump::source::open_source;

/// Execute the `run` command: parse, validate, and run a pipeline.
pub async fn execute(pipeline_path: &Path, dry_run: bool, limit: Option<u64>) -> Result<()> {
    let config = parser::parse_pipeline(pipeline_path)
        .with_context(|| format!("Failed to parse pipeline: {}", pipeline_path.display()))?;

    validator::validate_pipeline(&config)?;

    tracing::info!(
        pipeline = config.pipeline,
        source = %config.source.path.display(),
        destination = %config.destination.path.display(),
        parallelism = config.resources.parallelism,
        "Pipeline validated"
    );

    // --limit implies a preview: never touch the destination.
    let dry_run = dry_run || limit.is_some();
    let options = ExecutionOptions { dry_run, limit };

    let source = open_source(&config.source.path);
    let sink = open_sink(&config.destination.path);

    let result = run_pipeline(&config, source, sink, options)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    if dry_run {
        println!(
            "Dry run of '{}' complete: {} rows read, {} records produced.",
            config.pipeline, result.rows_read, result.records_written
        );
        return Ok(());
    }

    println!("Pipeline '{}' completed successfully.", config.pipeline);
    println!("  Rows read:       {}", result.rows_read);
    println!("  Records written: {}", result.records_written);
    if result.records_skipped > 0 {
        println!("  Records skipped: {}", result.records_skipped);
    }
    if result.records_dlq > 0 {
        println!("  Records to DLQ:  {}", result.records_dlq);
    }
    println!("  Bytes written:   {}", format_bytes(result.bytes_written));
    println!("  Duration:        {:.2}s", result.duration_secs);
    if result.duration_secs > 0.0 {
        println!(
            "  Throughput:      {:.0} rows/sec",
            result.rows_read as f64 / result.duration_secs
        );
    }

    // Machine-readable JSON for benchmarking tools
    let json = serde_json::json!({
        "pipeline": config.pipeline,
        "rows_read": result.rows_read,
        "records_written": result.records_written,
        "records_skipped": result.records_skipped,
        "records_dlq": result.records_dlq,
        "bytes_written": result.bytes_written,
        "duration_secs": result.duration_secs,
    });
    println!("{json}");

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes >= 1_048_576 {
        format!("{:.2} MiB", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1024 {
        format!("{:.1} KiB", bytes as f64 / 1024.0)
    } else {
        format!("{bytes} B")
    }
}
