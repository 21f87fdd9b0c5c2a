//! Voxlead error type.

use thiserror::Error;

/// Errors produced across the Voxlead workspace.
#[derive(Debug, Error)]
pub enum VoxleadError {
    /// Configuration loading or parsing failure.
    #[error("Config error: {0}")]
    Config(String),

    /// Record store failure (open, query, or update).
    #[error("Store error: {0}")]
    Store(String),

    /// Outbound channel failure (SMTP send, vendor call).
    #[error("Channel error: {0}")]
    Channel(String),

    /// Caller-supplied data rejected by validation.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used across the workspace.
pub type Result<T> = std::result::Result<T, VoxleadError>;
