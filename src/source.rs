//! Source side: paginated scan over wide-column rows.
//!
//! [`RowSource`] is the contract the engine reads through. The JSONL
//! implementation stands in for the wide-column store scan; the in-memory
//! implementation backs tests.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ValidationResult;
use crate::row::SourceRow;

/// Paginated scan cursor over source rows.
///
/// `next_page` returns up to `page_size` rows; an empty page signals
/// end-of-scan. Implementations are consumed by a single reader task, so the
/// cursor is `&mut self`.
pub trait RowSource: Send {
    /// Connectivity check used by the `check` command.
    fn validate(&self) -> ValidationResult;

    /// Read the next page of rows, or an empty `Vec` at end-of-scan.
    fn next_page(&mut self, page_size: usize) -> Result<Vec<SourceRow>>;
}

/// JSON wire form of one row, as stored in a JSONL scan file.
///
/// Cell values are JSON strings; raw non-UTF-8 bytes cannot ride through this
/// form, which is fine for the file-backed source (the in-memory source and
/// the transformer still handle arbitrary bytes).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRow {
    pub key: String,
    #[serde(default)]
    pub cells: BTreeMap<String, BTreeMap<String, String>>,
}

impl JsonRow {
    /// Lossy projection of a [`SourceRow`] for DLQ and debug output.
    #[must_use]
    pub fn from_row(row: &SourceRow) -> Self {
        let mut cells: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
        for (family, qualifier, value) in row.cells() {
            cells
                .entry(family.to_string())
                .or_default()
                .insert(
                    qualifier.to_string(),
                    String::from_utf8_lossy(value).into_owned(),
                );
        }
        Self {
            key: row.key_lossy(),
            cells,
        }
    }
}

impl From<JsonRow> for SourceRow {
    fn from(wire: JsonRow) -> Self {
        let mut row = SourceRow::new(wire.key);
        for (family, quals) in wire.cells {
            for (qualifier, value) in quals {
                row.set_cell(family.clone(), qualifier, value);
            }
        }
        row
    }
}

/// File-backed scan: one JSON row per line.
pub struct JsonlRowSource {
    path: PathBuf,
    reader: Option<BufReader<File>>,
    line_no: u64,
}

impl JsonlRowSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            reader: None,
            line_no: 0,
        }
    }

    fn open(&mut self) -> Result<&mut BufReader<File>> {
        if self.reader.is_none() {
            let file = File::open(&self.path)
                .with_context(|| format!("Failed to open source file: {}", self.path.display()))?;
            self.reader = Some(BufReader::new(file));
        }
        Ok(self.reader.as_mut().expect("reader just opened"))
    }
}

impl RowSource for JsonlRowSource {
    fn validate(&self) -> ValidationResult {
        match File::open(&self.path) {
            Ok(_) => ValidationResult::success(format!("source readable: {}", self.path.display())),
            Err(e) => {
                ValidationResult::failed(format!("cannot open {}: {e}", self.path.display()))
            }
        }
    }

    fn next_page(&mut self, page_size: usize) -> Result<Vec<SourceRow>> {
        let path = self.path.clone();
        let start_line = self.line_no;
        let reader = self.open()?;
        let mut page = Vec::with_capacity(page_size);
        let mut line = String::new();
        let mut line_no = start_line;

        while page.len() < page_size {
            line.clear();
            let read = reader
                .read_line(&mut line)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            if read == 0 {
                break;
            }
            line_no += 1;
            let trimmed = line.trim_end_matches(['\n', '\r']);
            if trimmed.is_empty() {
                continue;
            }
            let wire: JsonRow = serde_json::from_str(trimmed).with_context(|| {
                format!("Malformed row JSON at {}:{line_no}", path.display())
            })?;
            page.push(SourceRow::from(wire));
        }

        self.line_no = line_no;
        Ok(page)
    }
}

/// In-memory scan over a fixed set of rows (tests, dry experiments).
pub struct MemoryRowSource {
    rows: Vec<SourceRow>,
    cursor: usize,
}

impl MemoryRowSource {
    #[must_use]
    pub fn new(rows: Vec<SourceRow>) -> Self {
        Self { rows, cursor: 0 }
    }
}

impl RowSource for MemoryRowSource {
    fn validate(&self) -> ValidationResult {
        ValidationResult::success(format!("{} rows in memory", self.rows.len()))
    }

    fn next_page(&mut self, page_size: usize) -> Result<Vec<SourceRow>> {
        let end = (self.cursor + page_size).min(self.rows.len());
        let page = self.rows[self.cursor..end].to_vec();
        self.cursor = end;
        Ok(page)
    }
}

/// Build the configured row source.
#[must_use]
pub fn open_source(path: &Path) -> Box<dyn RowSource> {
    Box::new(JsonlRowSource::new(path))
}
