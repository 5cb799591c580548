//! Error taxonomy shared by the store, the ADIF codec and the settings file.
//!
//! Callers get one of three families: the input was rejected before touching
//! anything (`Validation`), SQLite refused the operation (`Storage`), or the
//! filesystem did (`Io`). Each variant names the operation that failed and
//! keeps the underlying cause reachable through `source()`.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, LogError>;

#[derive(Error, Debug)]
pub enum LogError {
    #[error("validation error in {field}: {message}")]
    Validation { field: String, message: String },

    #[error("{operation} failed: {source}")]
    Storage {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("{operation} failed for {}: {source}", .path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LogError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        LogError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub(crate) fn storage(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| LogError::Storage { operation, source }
    }

    pub(crate) fn io(
        operation: &'static str,
        path: impl Into<PathBuf>,
    ) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| LogError::Io {
            operation,
            path,
            source,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, LogError::Validation { .. })
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, LogError::Storage { .. })
    }

    pub fn is_io(&self) -> bool {
        matches!(self, LogError::Io { .. })
    }
}
