//! Core error types for fieldkit-core.
//!
//! Every plugin operation fails with one of three caller-facing kinds:
//! validation (bad input, nothing mutated), invalid state (operation not
//! legal for the current session state) or storage (persisted blob
//! unreadable, operation aborted). Config and IO errors only surface from
//! host setup.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for fieldkit-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Missing or malformed caller input
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Operation not allowed in the current state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Preference store errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors outside of persisted blobs
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Image encoding errors
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl CoreError {
    /// Stable tag for the error kind, used for exit codes and bridge replies.
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::Validation(_) => "validation",
            CoreError::InvalidState(_) => "invalid_state",
            CoreError::Storage(_) => "storage",
            CoreError::Config(_) => "config",
            CoreError::Io(_) => "io",
            CoreError::Json(_) => "json",
            CoreError::Image(_) => "image",
        }
    }

    pub(crate) fn invalid_state(message: impl Into<String>) -> Self {
        CoreError::InvalidState(message.into())
    }
}

/// Preference store errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open the backing database
    #[error("Failed to open preference store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked by another writer
    #[error("Preference store is locked")]
    Locked,

    /// A persisted blob could not be decoded
    #[error("Corrupt blob at {namespace}/{key}: {source}")]
    Corrupt {
        namespace: String,
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A collection could not be encoded for writing
    #[error("Failed to encode {namespace}/{key}: {source}")]
    Encode {
        namespace: String,
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// In-process lock was poisoned by a panicking writer
    #[error("Collection lock poisoned: {0}")]
    Poisoned(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be determined or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Required argument absent
    #[error("Missing required field '{0}'")]
    Missing(&'static str),

    /// Argument present but unusable
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: &'static str, message: String },

    /// Bridge call addressed an unknown plugin or method
    #[error("Unknown method {plugin}.{method}")]
    UnknownMethod { plugin: String, method: String },
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked
                    || e.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    StorageError::Locked
                } else {
                    StorageError::QueryFailed(err.to_string())
                }
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for StorageError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        StorageError::Poisoned(err.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for CoreError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        CoreError::Storage(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_tags_are_stable() {
        assert_eq!(
            CoreError::from(ValidationError::Missing("actionType")).kind(),
            "validation"
        );
        assert_eq!(CoreError::invalid_state("idle").kind(), "invalid_state");
        assert_eq!(
            CoreError::from(StorageError::Locked).kind(),
            "storage"
        );
    }

    #[test]
    fn validation_message_names_field() {
        let err = CoreError::from(ValidationError::Missing("projectId"));
        assert_eq!(
            err.to_string(),
            "Validation error: Missing required field 'projectId'"
        );
    }
}
