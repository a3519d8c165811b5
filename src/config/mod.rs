//! Pipeline configuration: YAML model, parsing, and semantic validation.

pub mod parser;
pub mod types;
pub mod validator;

pub use parser::{parse_pipeline, parse_pipeline_str};
pub use types::{
    DestinationConfig, PipelineConfig, RecordErrorPolicy, ResourceConfig, SourceConfig,
};
pub use validator::validate_pipeline;
