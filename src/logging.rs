use tracing_subscriber::EnvFilter;

/// Build the default filter directives for the binary: the requested level
/// applies to this crate, everything else stays at `warn`.
fn default_directives(log_level: &str) -> String {
    format!("warn,postdump={log_level}")
}

/// Initialize structured logging for the `postdump` binary.
///
/// `RUST_LOG`, when set, takes precedence over the `--log-level` flag.
pub fn init(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(log_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
