//! Shared types, error model, and configuration for docmodernizer.
//!
//! This crate is the foundation depended on by all other docmodernizer crates.
//! It provides:
//! - [`ModernizerError`]: the unified error type
//! - Pipeline data model ([`PipelineState`], [`StateUpdate`], [`Issue`],
//!   [`ResearchResult`], [`QualityReport`])
//! - Configuration ([`AppConfig`], config loading, API key resolution)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, FetchErrorPolicy, PipelineSettings, ProviderConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, resolve_api_key,
    validate_api_keys,
};
pub use error::{ModernizerError, Result};
pub use types::{
    Issue, PipelineState, QualityReport, ResearchResult, RunId, Severity, StateUpdate,
};
