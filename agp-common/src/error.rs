//! Common error types for AutoGenre

use thiserror::Error;

/// Common result type for AutoGenre operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across AutoGenre crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failed to encode or decode a persisted document
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
