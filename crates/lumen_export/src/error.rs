//! # Export Error Types
//!
//! Only two things can fail during export: the backend refusing a buffer,
//! and loading configuration. Unsupported input and missing optional data
//! are resolved with defaults and never surface here.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by a compute backend while creating a buffer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The device could not allocate the buffer.
    #[error("failed to allocate {label} ({words} words): {reason}")]
    Allocation {
        /// Buffer label.
        label: String,
        /// Requested size in 32-bit words.
        words: usize,
        /// Backend-specific reason.
        reason: String,
    },

    /// The buffer exceeds what the device can bind.
    #[error("{label} is too large: {words} words, device limit {limit}")]
    TooLarge {
        /// Buffer label.
        label: String,
        /// Requested size in 32-bit words.
        words: usize,
        /// Device limit in 32-bit words.
        limit: usize,
    },
}

/// Errors that can occur while exporting a scene.
#[derive(Error, Debug)]
pub enum ExportError {
    /// A buffer could not be created. Previously published state is intact.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Configuration text could not be parsed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be read.
    #[error("failed to read configuration {}: {source}", .path.display())]
    ConfigIo {
        /// File that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_converts() {
        let err: ExportError = BackendError::TooLarge {
            label: "octree_data".to_string(),
            words: 10,
            limit: 4,
        }
        .into();
        assert!(matches!(err, ExportError::Backend(BackendError::TooLarge { .. })));
        assert_eq!(err.to_string(), "octree_data is too large: 10 words, device limit 4");
    }
}
