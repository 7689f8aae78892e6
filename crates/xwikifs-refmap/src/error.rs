//! Error types for RefMap loading and persistence.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading or writing a [`RefMap`](crate::RefMap).
#[derive(Debug, Error)]
pub enum RefMapError {
    /// A declared reference has no readable backing file.
    #[error("missing reference {id:?} (expected at {path:?}): {source}")]
    MissingReference {
        id: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The YAML text could not be parsed.
    #[error("yaml parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The YAML tree does not have the shape of a RefMap.
    #[error("malformed structure: {0}")]
    Malformed(String),

    /// I/O error while reading or writing the primary file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for RefMap operations.
pub type Result<T> = std::result::Result<T, RefMapError>;
