//! Request building for the causal-analysis execution service.
//!
//! This crate turns causal-model configuration into node-graph request
//! payloads (`builders`, `tables`), derives follow-up state from the
//! specification curve (`specification`), and ties both into end-to-end
//! request assembly (`pipeline`).

pub mod builders;
pub mod pipeline;
pub mod specification;
pub mod tables;
