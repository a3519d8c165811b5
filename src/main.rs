mod commands;
mod logging;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "postdump",
    version,
    about = "Dump the wide-column post table into the analytical warehouse"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a dump pipeline
    Run {
        /// Path to pipeline YAML file
        pipeline: PathBuf,
        /// Preview mode: skip the destination, print output to stdout
        #[arg(long)]
        dry_run: bool,
        /// Maximum rows to read (implies --dry-run)
        #[arg(long)]
        limit: Option<u64>,
    },
    /// Validate pipeline configuration and connectivity
    Check {
        /// Path to pipeline YAML file
        pipeline: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init(&cli.log_level);

    match cli.command {
        Commands::Run {
            pipeline,
            dry_run,
            limit,
        } => commands::run::execute(&pipeline, dry_run, limit).await,
        Commands::Check { pipeline } => commands::check::execute(&pipeline).await,
    }
}
