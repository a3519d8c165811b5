//! Pipeline execution: bounded worker-pool runner and run results.

pub mod result;
pub mod runner;

pub use result::{CheckResult, RunSummary};
pub use runner::{check_pipeline, run_pipeline, ExecutionOptions};
