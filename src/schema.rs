//! Destination table schema and write-policy flags.
//!
//! The schema is a static ordered field list declared once at pipeline
//! startup; the dispositions are declarative flags handed to the sink, not
//! logic.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Scalar type of a destination column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldType {
    String,
    Float,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("STRING"),
            Self::Float => f.write_str("FLOAT"),
        }
    }
}

/// One (name, type) column of the destination table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl TableField {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// Ordered destination schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub fields: Vec<TableField>,
}

impl TableSchema {
    /// The fixed five-column schema of the post dump table.
    #[must_use]
    pub fn post_dump() -> Self {
        Self {
            fields: vec![
                TableField::new("postId", FieldType::String),
                TableField::new("user", FieldType::String),
                TableField::new("message", FieldType::String),
                TableField::new("lat", FieldType::Float),
                TableField::new("lon", FieldType::Float),
            ],
        }
    }

    /// Ordered field names.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

/// What to do with existing destination rows on a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteDisposition {
    /// Replace the table contents (visible only once the run commits).
    #[default]
    Truncate,
    /// Add to existing contents.
    Append,
}

/// What to do when the destination table does not exist yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreateDisposition {
    /// Create the table (and schema) if absent.
    #[default]
    CreateIfNeeded,
    /// Fail if the table is absent.
    Never,
}
