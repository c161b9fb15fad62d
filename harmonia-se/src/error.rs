//! Error types for harmonia-se
//!
//! Defines module-specific error types using thiserror for clear error
//! propagation.

use thiserror::Error;

/// Main error type for the harmonia-se module
#[derive(Error, Debug)]
pub enum Error {
    /// Catalog or schema document cannot be parsed
    #[error("Malformed catalog input: {0}")]
    MalformedInput(String),

    /// Export request failed pre-flight validation; carries every violation
    #[error("Invalid export request: {}", .0.join("; "))]
    InvalidRequest(Vec<String>),

    /// Audio payload encoding errors
    #[error("Audio encode error: {0}")]
    AudioEncode(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using harmonia-se Error
pub type Result<T> = std::result::Result<T, Error>;
