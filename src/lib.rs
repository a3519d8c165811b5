//! postdump: batch pipeline that scans a wide-column post table, flattens
//! each row into a five-field record, and replaces the contents of an
//! analytical warehouse table with the result.
//!
//! The core is [`transform::transform_row`], a pure per-row mapping; the
//! [`engine`] drives it with a bounded worker pool between a paginated
//! [`source::RowSource`] scan and a batched [`sink::RecordSink`] writer.

pub mod config;
pub mod dlq;
pub mod engine;
pub mod error;
pub mod record;
pub mod row;
pub mod schema;
pub mod sink;
pub mod source;
pub mod transform;

pub use engine::{check_pipeline, run_pipeline, ExecutionOptions, RunSummary};
pub use error::{PipelineError, RecordError};
pub use record::PostRecord;
pub use row::SourceRow;
pub use transform::transform_row;
