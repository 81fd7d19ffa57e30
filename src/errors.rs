// src/errors.rs

//! Crate-wide error types.
//!
//! Errors are split by where they are raised:
//! - [`ConfigError`]: `input`, `validate` and `configure`.
//! - [`SubmitError`]: `operation` and `context`, before any work starts.
//! - [`OperationError`]: the outcome of an operation that ran.
//!
//! [`BackendError`] wraps the first two for callers that only need to
//! report them.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::{OperationField, OperationType, ValueKind};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required configuration option '{key}'")]
    MissingRequired { key: String },

    #[error("unsupported configuration option '{key}'")]
    Unsupported { key: String },

    #[error("configuration option '{key}' must be a {expected}, got a {found}")]
    TypeMismatch {
        key: String,
        expected: ValueKind,
        found: ValueKind,
    },

    #[error("invalid value for configuration option '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("backend is already configured with a different value for '{key}'")]
    AlreadyConfigured { key: String },

    #[error("reading input for '{key}': {source}")]
    Input {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Configuration error: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ConfigError {
    /// The configuration key this error is about, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            ConfigError::MissingRequired { key }
            | ConfigError::Unsupported { key }
            | ConfigError::TypeMismatch { key, .. }
            | ConfigError::InvalidValue { key, .. }
            | ConfigError::AlreadyConfigured { key }
            | ConfigError::Input { key, .. } => Some(key),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("{0} operations are not supported by this backend")]
    UnsupportedType(OperationType),

    #[error("{op_type} operation does not accept: {}", join_fields(.fields))]
    UnsupportedFields {
        op_type: OperationType,
        fields: Vec<OperationField>,
    },

    #[error("{0} operation requires a module, a plan or a plan id")]
    MissingModule(OperationType),

    #[error("module loaded from {0:?} is missing child modules; fetch them first")]
    ModuleNotLoaded(PathBuf),

    #[error("backend must be configured before running operations")]
    NotConfigured,

    #[error("invalid operation: {0}")]
    Invalid(String),

    #[error("operations must be submitted from within a Tokio runtime")]
    NoRuntime,
}

fn join_fields(fields: &[OperationField]) -> String {
    fields
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Terminal error of a finished operation.
#[derive(Error, Debug)]
pub enum OperationError {
    #[error("operation canceled")]
    Canceled,

    #[error("operation failed after partially applying changes: {0}")]
    Partial(#[source] anyhow::Error),

    #[error("operation was abandoned by the backend before completing")]
    Abandoned,

    #[error(transparent)]
    Execution(#[from] anyhow::Error),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid resource address '{0}'")]
pub struct AddressError(pub String);

/// An integer too large in magnitude for [`Value::Number`](crate::Value::Number)
/// to hold exactly.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("integer {0} cannot be represented exactly as a number value")]
pub struct InexactNumber(pub i64);

#[derive(Error, Debug)]
pub enum BackendError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Submit(#[from] SubmitError),

    #[error("invalid backend configuration:{}", list_errors(.0))]
    Validation(Vec<ConfigError>),

    #[error("unknown backend type '{0}'")]
    UnknownBackend(String),

    #[error("backend does not support {0}")]
    Unsupported(&'static str),

    #[error("state unavailable: {0}")]
    StateUnavailable(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn list_errors(errors: &[ConfigError]) -> String {
    errors.iter().map(|e| format!("\n  - {e}")).collect()
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, BackendError>;
