//! Store errors
//!
//! Only writes surface errors. Reads fall back to an empty list and log.

use thiserror::Error;

/// Failure while mirroring store state to the persistence backend
#[derive(Debug, Error)]
pub enum StoreError {
    /// No storage backend is reachable (e.g. LocalStorage disabled)
    #[error("storage backend unavailable")]
    Unavailable,

    /// The backend rejected the call (quota exceeded, security error, ...)
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("failed to serialize store data: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
