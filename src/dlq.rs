//! Dead-letter queue for rows that failed to transform.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RecordError;
use crate::row::SourceRow;
use crate::source::JsonRow;

/// One row that failed processing, captured for later inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DlqRecord {
    /// Row key (lossy UTF-8 rendering).
    pub row_key: String,
    /// The offending row in its JSON wire form.
    pub row: JsonRow,
    /// Human-readable error description.
    pub error_message: String,
    /// Error classification (`missing_cell`, `decode`, `parse`).
    pub error_category: String,
    /// When the failure occurred.
    pub failed_at: DateTime<Utc>,
}

impl DlqRecord {
    #[must_use]
    pub fn from_failure(row: &SourceRow, error: &RecordError) -> Self {
        Self {
            row_key: row.key_lossy(),
            row: JsonRow::from_row(row),
            error_message: error.to_string(),
            error_category: error.category().to_string(),
            failed_at: Utc::now(),
        }
    }
}

/// Appends [`DlqRecord`]s to a JSONL dead-letter file.
pub struct DlqWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    count: u64,
}

impl DlqWriter {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create DLQ directory: {}", dir.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open DLQ file: {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            count: 0,
        })
    }

    /// Append one record and flush it, so captured rows survive even when
    /// the run aborts before [`finish`](Self::finish).
    pub fn append(&mut self, record: &DlqRecord) -> Result<()> {
        let line = serde_json::to_string(record).context("Failed to serialize DLQ record")?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer
            .flush()
            .with_context(|| format!("Failed to flush DLQ file: {}", self.path.display()))?;
        self.count += 1;
        Ok(())
    }

    /// Report how many records were written; everything is already flushed.
    pub fn finish(self) -> Result<u64> {
        tracing::info!(dlq = %self.path.display(), records = self.count, "DLQ records persisted");
        Ok(self.count)
    }
}
