//! Error model for the pipeline.
//!
//! [`RecordError`] is the per-record taxonomy (missing cell, bad UTF-8, bad
//! float); [`PipelineError`] is the run-level split between a record failure
//! surfaced under the `fail` policy and opaque infrastructure errors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a single source row could not be transformed.
///
/// Each variant names the cell or field at fault so operators can find the
/// bad data without re-running anything.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    /// A required (family, qualifier) cell is absent from the row.
    #[error("missing cell {family}:{qualifier}")]
    MissingCell { family: String, qualifier: String },

    /// Stored bytes are not valid UTF-8.
    #[error("invalid utf-8 in {field}")]
    InvalidUtf8 { field: String },

    /// `lat`/`lon` text is not a base-10 float.
    #[error("invalid float in {field}: {value:?}")]
    InvalidFloat { field: String, value: String },
}

impl RecordError {
    pub(crate) fn missing_cell(family: &str, qualifier: &str) -> Self {
        Self::MissingCell {
            family: family.to_string(),
            qualifier: qualifier.to_string(),
        }
    }

    pub(crate) fn invalid_utf8(field: &str) -> Self {
        Self::InvalidUtf8 {
            field: field.to_string(),
        }
    }

    pub(crate) fn invalid_float(field: &str, value: &str) -> Self {
        Self::InvalidFloat {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    /// Category label used in DLQ records and logs.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::MissingCell { .. } => "missing_cell",
            Self::InvalidUtf8 { .. } => "decode",
            Self::InvalidFloat { .. } => "parse",
        }
    }
}

/// Run-level pipeline error.
///
/// `Record` carries the row key of the record that failed; it is only
/// constructed when the configured policy is `fail`. `Infrastructure` wraps
/// I/O, channel, and join failures from the host side.
#[derive(Debug)]
pub enum PipelineError {
    /// A record failed to transform and the policy aborts the run.
    Record { row_key: String, source: RecordError },
    /// Host-side failure (I/O, channel, task join).
    Infrastructure(anyhow::Error),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Record { row_key, source } => {
                write!(f, "record {row_key:?} failed: {source}")
            }
            Self::Infrastructure(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Record { source, .. } => Some(source),
            Self::Infrastructure(e) => Some(e.as_ref()),
        }
    }
}

impl From<anyhow::Error> for PipelineError {
    fn from(e: anyhow::Error) -> Self {
        Self::Infrastructure(e)
    }
}

impl PipelineError {
    pub(crate) fn record(row_key: String, source: RecordError) -> Self {
        Self::Record { row_key, source }
    }

    /// The typed record error, if this is a `Record` variant.
    #[must_use]
    pub fn as_record_error(&self) -> Option<&RecordError> {
        match self {
            Self::Record { source, .. } => Some(source),
            Self::Infrastructure(_) => None,
        }
    }
}

/// Connectivity check outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Success,
    Failed,
}

/// Result of a source or sink connectivity check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub status: ValidationStatus,
    pub message: String,
}

impl ValidationResult {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: ValidationStatus::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: ValidationStatus::Failed,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == ValidationStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_error_display_names_the_cell() {
        let err = RecordError::missing_cell("post", "message");
        assert_eq!(err.to_string(), "missing cell post:message");
        assert_eq!(err.category(), "missing_cell");
    }

    #[test]
    fn invalid_float_display_includes_value() {
        let err = RecordError::invalid_float("lat", "N/A");
        assert_eq!(err.to_string(), "invalid float in lat: \"N/A\"");
        assert_eq!(err.category(), "parse");
    }

    #[test]
    fn pipeline_error_record_carries_row_key() {
        let err = PipelineError::record(
            "post-42".into(),
            RecordError::invalid_utf8("user"),
        );
        assert!(err.to_string().contains("post-42"));
        assert!(err.as_record_error().is_some());
    }

    #[test]
    fn pipeline_error_from_anyhow_is_infrastructure() {
        let err: PipelineError = anyhow::anyhow!("disk full").into();
        assert!(matches!(err, PipelineError::Infrastructure(_)));
        assert!(err.as_record_error().is_none());
    }

    #[test]
    fn validation_result_constructors() {
        assert!(ValidationResult::success("ok").is_success());
        assert!(!ValidationResult::failed("no such file").is_success());
    }
}
