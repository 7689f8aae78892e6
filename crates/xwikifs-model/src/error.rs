//! Error types for model loading and assembly.

use std::path::{Path, PathBuf};

use thiserror::Error;
use xwikifs_refmap::RefMapError;

/// Errors that can occur while loading documents, classes and objects.
///
/// Every loader fails fast: the first error aborts the load and no partial
/// model is returned.
#[derive(Debug, Error)]
pub enum LoadError {
    /// A declared reference id has no backing file.
    #[error("missing reference {id:?} (expected at {path:?}): {source}")]
    MissingReference {
        id: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A directory or object file name does not follow the naming grammar.
    #[error("invalid identifier {name:?}: {reason}")]
    InvalidIdentifier { name: String, reason: String },

    /// An object refers to a class whose definition file does not exist.
    #[error("class file for {class_name} not found at {path:?}")]
    MissingClass { class_name: String, path: PathBuf },

    /// An object property has no definition in its class.
    #[error("property {property:?} is not described in class {class_name}")]
    UndeclaredProperty { property: String, class_name: String },

    /// The path expected to be a directory is missing or is a file.
    #[error("{path:?} does not exist or is not a directory")]
    NotADirectory { path: PathBuf },

    /// A file parsed as YAML but does not have the expected shape.
    #[error("malformed {path:?}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    /// A file is not valid YAML.
    #[error("yaml parse error in {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The layout configuration could not be read.
    #[error("invalid layout configuration: {0}")]
    Config(String),

    /// Read or write failure not otherwise classified.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl LoadError {
    /// Attach the file being loaded to a RefMap error.
    pub fn from_refmap(err: RefMapError, path: &Path) -> Self {
        match err {
            RefMapError::MissingReference { id, path, source } => {
                LoadError::MissingReference { id, path, source }
            }
            RefMapError::Parse(source) => LoadError::Parse {
                path: path.to_path_buf(),
                source,
            },
            RefMapError::Malformed(reason) => LoadError::Malformed {
                path: path.to_path_buf(),
                reason,
            },
            RefMapError::Io(e) => LoadError::Io(e),
        }
    }

    pub(crate) fn invalid_identifier(name: &str, reason: impl Into<String>) -> Self {
        LoadError::InvalidIdentifier {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Convenience alias for model results.
pub type LoadResult<T> = Result<T, LoadError>;
