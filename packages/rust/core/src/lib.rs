//! Core pipeline orchestration for docmodernizer.
//!
//! Ties together page fetching, the four LLM stages and report rendering
//! into a single run (see [`pipeline::Pipeline::run`]).

pub mod pipeline;
pub mod report;
pub mod stages;

pub use pipeline::{Pipeline, PipelineConfig, ProgressReporter, SilentProgress};
pub use report::ModernizationReport;
pub use stages::{Stage, StageFailure};
