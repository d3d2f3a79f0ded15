//! Error types for the dataset catalog.
//!
//! Library crates use [`CatalogError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for top-level reporting.

use std::path::PathBuf;

/// Top-level error type for all catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A metadata sidecar could not be read or parsed.
    ///
    /// Recoverable: the rebuild logs it and omits the dataset.
    #[error("skipping sidecar {path:?}: {message}")]
    Sidecar { path: PathBuf, message: String },

    /// Directory traversal failed below the data root.
    #[error("scan error: {0}")]
    Walk(String),

    /// The catalog document could not be serialized.
    #[error("serialization error: {0}")]
    Serialize(String),

    /// A catalog document violates its invariants.
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CatalogError>;

impl CatalogError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a sidecar error for the given file.
    pub fn sidecar(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Sidecar {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the rebuild may skip the offending dataset and carry on.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Sidecar { .. })
    }
}
