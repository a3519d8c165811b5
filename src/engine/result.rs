//! Run result types.

use crate::error::ValidationResult;

/// Aggregate counts and timing for one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Rows read from the source scan.
    pub rows_read: u64,
    /// Records written (and committed) to the sink.
    pub records_written: u64,
    /// Rows dropped under the `skip` policy.
    pub records_skipped: u64,
    /// Rows routed to the dead-letter file under the `dlq` policy.
    pub records_dlq: u64,
    /// Bytes written to the destination.
    pub bytes_written: u64,
    pub duration_secs: f64,
}

/// Result of a pipeline `check`.
#[derive(Debug)]
pub struct CheckResult {
    pub source_validation: ValidationResult,
    pub destination_validation: ValidationResult,
}

impl CheckResult {
    /// `true` when every check passed.
    #[must_use]
    pub fn all_ok(&self) -> bool {
        self.source_validation.is_success() && self.destination_validation.is_success()
    }
}
