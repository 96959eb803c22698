//! Core error types for focusflick-core.
//!
//! Three kinds of failure matter to callers: a command issued from the wrong
//! timer state (a defect in the caller), rejected user input, and storage
//! failures. Everything else is wrapped for `?` convenience.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for focusflick-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A timer command was issued from a state that does not accept it.
    #[error("Invalid transition: cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    /// User input was rejected; the previous value is retained.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A task or habit id that does not exist
    #[error("No {kind} with id '{id}'")]
    NotFound { kind: &'static str, id: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    pub(crate) fn invalid(action: &'static str, state: &'static str) -> Self {
        CoreError::InvalidTransition { action, state }
    }

    pub(crate) fn not_found(kind: &'static str, id: &str) -> Self {
        CoreError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// True for errors the presentation layer should show to the user as a
    /// correctable message.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, CoreError::Validation(_) | CoreError::NotFound { .. })
    }
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to read the document
    #[error("Failed to load data from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to write the document
    #[error("Failed to save data to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Document could not be parsed
    #[error("Failed to parse data: {0}")]
    ParseFailed(String),

    /// Home/config directory could not be determined or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required name was blank
    #[error("{0} name cannot be empty")]
    EmptyName(&'static str),

    /// Due date did not match MM/DD/YYYY or YYYY-MM-DD
    #[error("Invalid date '{0}'. Use MM/DD/YYYY")]
    InvalidDate(String),

    /// A setting or goal that must be positive was zero
    #[error("'{0}' must be a positive number")]
    NotPositive(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
