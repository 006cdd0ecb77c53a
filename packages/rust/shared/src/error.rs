//! Error types for causespec.
//!
//! Library crates use [`CauseSpecError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all causespec operations.
#[derive(Debug, thiserror::Error)]
pub enum CauseSpecError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Input document could not be parsed.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A built request could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Input is well-formed but cannot produce a usable request.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// A string does not name any member of a closed enumeration.
    #[error("unmapped {kind} value: {value:?}")]
    UnmappedEnum { kind: &'static str, value: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CauseSpecError>;

impl CauseSpecError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Signal that `value` has no entry for the enumeration `kind`.
    pub fn unmapped(kind: &'static str, value: impl Into<String>) -> Self {
        Self::UnmappedEnum {
            kind,
            value: value.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
