// error.rs — Error types for the emitter entry point and the driver
//
// `EmitError` is what `emit::emit` reports when a pass raised diagnostics at
// error level. `DriverError` covers everything outside emission proper:
// reading the model, decoding JSON, writing output.

use std::path::PathBuf;

use thiserror::Error;

use crate::diag::Diagnostic;

/// Result type for driver operations.
pub type DriverResult<T> = Result<T, DriverError>;

/// An emission pass finished with at least one error.
#[derive(Debug, Error)]
#[error("emission failed with {error_count} error(s)")]
pub struct EmitError {
    pub error_count: usize,
    /// Every diagnostic raised during the pass, warnings included.
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed program model: {0}")]
    Model(#[from] serde_json::Error),
}

impl DriverError {
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DriverError::Read {
            path: path.into(),
            source,
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DriverError::Write {
            path: path.into(),
            source,
        }
    }
}
