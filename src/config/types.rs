use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::schema::{CreateDisposition, WriteDisposition};

/// Top-level pipeline configuration, deserialized from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub version: String,
    pub pipeline: String,
    pub source: SourceConfig,
    pub destination: DestinationConfig,
    #[serde(default)]
    pub on_record_error: RecordErrorPolicy,
    /// Dead-letter file, required when `on_record_error` is `dlq`.
    pub dlq_path: Option<PathBuf>,
    #[serde(default)]
    pub resources: ResourceConfig,
}

/// Where the wide-column scan reads from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub path: PathBuf,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

/// Where the flattened dump is written, and the write-policy flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub write_disposition: WriteDisposition,
    #[serde(default)]
    pub create_disposition: CreateDisposition,
}

/// How to handle a row that fails to transform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordErrorPolicy {
    /// Abort the run on the first bad row.
    #[default]
    Fail,
    /// Log the bad row and continue.
    Skip,
    /// Route the bad row to the dead-letter file and continue.
    Dlq,
}

/// Worker pool sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConfig {
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_page_size() -> usize {
    500
}
fn default_parallelism() -> usize {
    4
}
fn default_batch_size() -> usize {
    500
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            parallelism: default_parallelism(),
            batch_size: default_batch_size(),
        }
    }
}
