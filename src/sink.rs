//! Sink side: batched writes into the warehouse table.
//!
//! [`RecordSink`] is the contract the engine writes through. Truncate mode
//! stages into a sibling file and renames at commit, so a failed run never
//! clobbers the previous table contents.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};

use crate::error::ValidationResult;
use crate::record::PostRecord;
use crate::schema::{CreateDisposition, TableSchema, WriteDisposition};

/// Totals reported by a sink at commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub records_written: u64,
    pub bytes_written: u64,
}

/// Batched record writer with explicit begin/commit lifecycle.
///
/// `begin` receives the destination schema and the two write-policy flags;
/// everything written before `commit` must not be observable if the run
/// fails.
pub trait RecordSink: Send {
    /// Connectivity check used by the `check` command.
    fn validate(&self) -> ValidationResult;

    fn begin(
        &mut self,
        schema: &TableSchema,
        write: WriteDisposition,
        create: CreateDisposition,
    ) -> Result<()>;

    fn write_batch(&mut self, records: &[PostRecord]) -> Result<()>;

    /// Make the run's output visible and return totals.
    fn commit(&mut self) -> Result<WriteSummary>;
}

struct OpenWriter {
    writer: BufWriter<File>,
    /// Staging path to rename over the destination at commit (truncate mode).
    staging: Option<PathBuf>,
    schema: TableSchema,
    create: CreateDisposition,
    summary: WriteSummary,
}

/// File-backed warehouse table: one JSON record per line, with a schema
/// sidecar written next to it on create.
pub struct JsonlRecordSink {
    path: PathBuf,
    open: Option<OpenWriter>,
}

impl JsonlRecordSink {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            open: None,
        }
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".staging");
        self.path.with_file_name(name)
    }

    fn schema_sidecar(path: &Path) -> PathBuf {
        let mut name = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".schema.json");
        path.with_file_name(name)
    }
}

impl RecordSink for JsonlRecordSink {
    fn validate(&self) -> ValidationResult {
        let dir = self.path.parent().filter(|p| !p.as_os_str().is_empty());
        match dir {
            Some(dir) if !dir.exists() => ValidationResult::failed(format!(
                "destination directory does not exist: {}",
                dir.display()
            )),
            _ => ValidationResult::success(format!("destination writable: {}", self.path.display())),
        }
    }

    fn begin(
        &mut self,
        schema: &TableSchema,
        write: WriteDisposition,
        create: CreateDisposition,
    ) -> Result<()> {
        if self.open.is_some() {
            bail!("sink already begun");
        }

        if create == CreateDisposition::Never && !self.path.exists() {
            bail!(
                "destination table does not exist and create_disposition is 'never': {}",
                self.path.display()
            );
        }
        if create == CreateDisposition::CreateIfNeeded {
            if let Some(dir) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir).with_context(|| {
                    format!("Failed to create destination directory: {}", dir.display())
                })?;
            }
        }

        let (file, staging) = match write {
            WriteDisposition::Truncate => {
                let staging = self.staging_path();
                let file = File::create(&staging).with_context(|| {
                    format!("Failed to create staging file: {}", staging.display())
                })?;
                (file, Some(staging))
            }
            WriteDisposition::Append => {
                let file = OpenOptions::new()
                    .create(create == CreateDisposition::CreateIfNeeded)
                    .append(true)
                    .open(&self.path)
                    .with_context(|| {
                        format!("Failed to open destination: {}", self.path.display())
                    })?;
                (file, None)
            }
        };

        self.open = Some(OpenWriter {
            writer: BufWriter::new(file),
            staging,
            schema: schema.clone(),
            create,
            summary: WriteSummary::default(),
        });
        Ok(())
    }

    fn write_batch(&mut self, records: &[PostRecord]) -> Result<()> {
        let open = self
            .open
            .as_mut()
            .context("write_batch called before begin")?;
        for record in records {
            let line = serde_json::to_string(record).context("Failed to serialize record")?;
            open.writer.write_all(line.as_bytes())?;
            open.writer.write_all(b"\n")?;
            open.summary.records_written += 1;
            open.summary.bytes_written += line.len() as u64 + 1;
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<WriteSummary> {
        let mut open = self.open.take().context("commit called before begin")?;
        open.writer.flush().context("Failed to flush destination")?;
        open.writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to finish destination write: {e}"))?
            .sync_all()
            .context("Failed to sync destination")?;

        if let Some(staging) = open.staging {
            std::fs::rename(&staging, &self.path).with_context(|| {
                format!(
                    "Failed to move staging file into place: {} -> {}",
                    staging.display(),
                    self.path.display()
                )
            })?;
        }

        if open.create == CreateDisposition::CreateIfNeeded {
            let sidecar = Self::schema_sidecar(&self.path);
            let schema_json = serde_json::to_string_pretty(&open.schema)
                .context("Failed to serialize schema")?;
            std::fs::write(&sidecar, schema_json)
                .with_context(|| format!("Failed to write schema sidecar: {}", sidecar.display()))?;
        }

        Ok(open.summary)
    }
}

impl Drop for JsonlRecordSink {
    fn drop(&mut self) {
        // Uncommitted staging output must not survive a failed run.
        if let Some(open) = self.open.take() {
            if let Some(staging) = open.staging {
                let _ = std::fs::remove_file(staging);
            }
        }
    }
}

/// In-memory sink; committed records are observable through a shared handle.
#[derive(Default)]
pub struct MemoryRecordSink {
    staged: Vec<PostRecord>,
    committed: Arc<Mutex<Vec<PostRecord>>>,
    disposition: WriteDisposition,
    begun: bool,
}

impl MemoryRecordSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the committed records, alive after the sink is consumed.
    #[must_use]
    pub fn committed(&self) -> Arc<Mutex<Vec<PostRecord>>> {
        Arc::clone(&self.committed)
    }
}

impl RecordSink for MemoryRecordSink {
    fn validate(&self) -> ValidationResult {
        ValidationResult::success("in-memory sink")
    }

    fn begin(
        &mut self,
        _schema: &TableSchema,
        write: WriteDisposition,
        _create: CreateDisposition,
    ) -> Result<()> {
        if self.begun {
            bail!("sink already begun");
        }
        self.begun = true;
        self.disposition = write;
        Ok(())
    }

    fn write_batch(&mut self, records: &[PostRecord]) -> Result<()> {
        if !self.begun {
            bail!("write_batch called before begin");
        }
        self.staged.extend_from_slice(records);
        Ok(())
    }

    fn commit(&mut self) -> Result<WriteSummary> {
        if !self.begun {
            bail!("commit called before begin");
        }
        self.begun = false;
        let records_written = self.staged.len() as u64;
        let mut committed = self
            .committed
            .lock()
            .map_err(|_| anyhow::anyhow!("committed records mutex poisoned"))?;
        if self.disposition == WriteDisposition::Truncate {
            committed.clear();
        }
        committed.append(&mut self.staged);
        Ok(WriteSummary {
            records_written,
            bytes_written: 0,
        })
    }
}

/// Build the configured record sink.
#[must_use]
pub fn open_sink(path: &Path) -> Box<dyn RecordSink> {
    Box::new(JsonlRecordSink::new(path))
}
