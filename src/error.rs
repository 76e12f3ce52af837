//! Keeper error types

use thiserror::Error;

/// Keeper error type
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Ingestion payload failed validation
    #[error("Invalid ingestion input: {0}")]
    InvalidInput(String),

    /// Timeline persistence fault
    #[error("Storage error: {0}")]
    Storage(String),

    /// Reasoning runtime error
    #[error("Agent error: {0}")]
    Agent(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Keeper operations
pub type Result<T> = std::result::Result<T, Error>;
