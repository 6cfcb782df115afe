use std::path::PathBuf;

use thiserror::Error;

/// Error type for signature operations.
///
/// There is no allocation-failure variant: allocation failure aborts the
/// process instead of surfacing as a recoverable error.
#[derive(Debug, Error)]
pub enum ZignError {
    /// A stored key or value could not be decoded.
    #[error("Malformed signature entry `{key}`: {reason}")]
    Format { key: String, reason: String },

    /// Input rejected before touching the store (empty name, zero mask, ...).
    #[error("Invalid signature input: {0}")]
    Validation(String),

    /// Reading or writing a signature file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The named signature or space does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Saving was requested but the store holds no signatures.
    #[error("No signatures to save")]
    EmptyStore,
}

impl ZignError {
    pub(crate) fn format(key: impl Into<String>, reason: impl Into<String>) -> Self {
        ZignError::Format { key: key.into(), reason: reason.into() }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ZignError::Io { path: path.into(), source }
    }
}

/// Convenience result type for signature operations.
pub type ZignResult<T> = Result<T, ZignError>;
