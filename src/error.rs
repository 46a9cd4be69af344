//! Error type shared by every store adapter.

use thiserror::Error;

/// Errors surfaced by the [`Store`](crate::store::Store) contract.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A create/update carried invalid or missing data.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The targeted task, category or rule does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A remote call failed: network, timeout or non-2xx response.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The local medium could not be written.
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Storage(e.to_string())
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        StoreError::Transport(e.to_string())
    }
}

/// Result type alias using StoreError.
pub type Result<T> = std::result::Result<T, StoreError>;
