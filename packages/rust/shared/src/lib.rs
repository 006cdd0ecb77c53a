//! Shared types, error model, and configuration for causespec.
//!
//! This crate is the foundation depended on by all other causespec crates.
//! It provides:
//! - [`CauseSpecError`] — the unified error type
//! - Domain types ([`ElementDefinition`], [`AlternativeModel`], [`Estimator`], [`Node`], ...)
//! - Configuration ([`AppConfig`], [`BuildOptions`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BuildOptions, DefaultsConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from,
};
pub use error::{CauseSpecError, Result};
pub use types::{
    AlternativeModel, AlternativeModels, ElementDefinition, ElementSpecs, Estimator,
    EstimatorGroup, EstimatorSpec, EstimatorType, ModelSpec, Node, NodeRequest,
    NodeResponseStatus, NodeType, PopulationSpec, RefutationSpec, RefutationType, RunSummary,
    SignificanceTestResult, Specification, SpecificationCurveConfig, VariableSpec,
};
