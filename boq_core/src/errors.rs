//! # Error Types
//!
//! Structured error types for boq_core.
//!
//! Editing and pricing never fail: bad numeric input is coerced and unknown
//! ids are no-ops. Errors only come out of the I/O boundaries (project files,
//! locks, CSV writing, reference-data parsing, storage lookups).
//!
//! ## Example
//!
//! ```rust
//! use boq_core::errors::{BoqError, BoqResult};
//!
//! fn require_title(title: &str) -> BoqResult<()> {
//!     if title.trim().is_empty() {
//!         return Err(BoqError::invalid_input("title", title, "Title must not be blank"));
//!     }
//!     Ok(())
//! }
//!
//! assert!(require_title("").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for boq_core operations
pub type BoqResult<T> = Result<T, BoqError>;

/// Structured error type for ledger I/O.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum BoqError {
    /// An input value was rejected at an I/O boundary
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// No project with this id exists in the store
    #[error("Project not found: {project_id}")]
    ProjectNotFound { project_id: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// File is locked by another user/process
    #[error("File locked: '{path}' is locked by {locked_by} since {locked_at}")]
    FileLocked {
        path: String,
        locked_by: String,
        locked_at: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Tabular export could not be written
    #[error("Export error: {reason}")]
    ExportError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl BoqError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        BoqError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a ProjectNotFound error
    pub fn project_not_found(project_id: impl Into<String>) -> Self {
        BoqError::ProjectNotFound {
            project_id: project_id.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        BoqError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileLocked error
    pub fn file_locked(path: impl Into<String>, locked_by: impl Into<String>, locked_at: impl Into<String>) -> Self {
        BoqError::FileLocked {
            path: path.into(),
            locked_by: locked_by.into(),
            locked_at: locked_at.into(),
        }
    }

    /// Create a SerializationError
    pub fn serialization(reason: impl Into<String>) -> Self {
        BoqError::SerializationError {
            reason: reason.into(),
        }
    }

    /// Create an ExportError
    pub fn export(reason: impl Into<String>) -> Self {
        BoqError::ExportError {
            reason: reason.into(),
        }
    }

    /// Check if this is a recoverable error (e.g., can retry)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, BoqError::FileLocked { .. })
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            BoqError::InvalidInput { .. } => "INVALID_INPUT",
            BoqError::ProjectNotFound { .. } => "PROJECT_NOT_FOUND",
            BoqError::FileError { .. } => "FILE_ERROR",
            BoqError::FileLocked { .. } => "FILE_LOCKED",
            BoqError::SerializationError { .. } => "SERIALIZATION_ERROR",
            BoqError::ExportError { .. } => "EXPORT_ERROR",
            BoqError::VersionMismatch { .. } => "VERSION_MISMATCH",
            BoqError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl From<csv::Error> for BoqError {
    fn from(err: csv::Error) -> Self {
        BoqError::export(err.to_string())
    }
}

impl From<serde_json::Error> for BoqError {
    fn from(err: serde_json::Error) -> Self {
        BoqError::serialization(err.to_string())
    }
}
