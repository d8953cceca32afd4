//! Error types for vaultpress operations.
//!
//! This module provides the common `Error` type and `Result<T>` alias used
//! across all vaultpress crates. Uses `thiserror` for derive macros.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur in vaultpress operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// I/O error tied to a specific path.
    #[error("I/O error at {path}: {source}")]
    IoWithPath {
        /// Path being accessed when the error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A file that must exist does not.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Expected content was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Input failed validation before any side effect happened.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Malformed input that could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An external process could not be run.
    #[error("Process error: {0}")]
    Process(String),

    /// An external process exceeded its time budget.
    #[error("Process timed out after {seconds}s: {command}")]
    Timeout {
        /// Command line that timed out.
        command: String,
        /// Timeout in seconds.
        seconds: u64,
    },
}

impl Error {
    /// Create an I/O error carrying the path that failed.
    pub fn io_with_path(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Self::IoWithPath {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a file-not-found error.
    pub fn file_not_found(path: impl AsRef<Path>) -> Self {
        Self::FileNotFound(path.as_ref().to_path_buf())
    }

    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Create a process error.
    pub fn process(msg: impl Into<String>) -> Self {
        Self::Process(msg.into())
    }

    /// Returns `true` for missing files and missing content.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::FileNotFound(_) | Self::NotFound(_))
    }

    /// Returns `true` for validation failures.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns `true` for any I/O failure.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io(_) | Self::IoWithPath { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias using vaultpress's Error type.
pub type Result<T> = std::result::Result<T, Error>;
