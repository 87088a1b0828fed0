//! Error types for blockbridge

use std::time::Duration;
use thiserror::Error;

/// Result type alias for blockbridge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to the backing node
#[derive(Error, Debug)]
pub enum Error {
    /// A required configuration value was missing at construction
    #[error("Config error: {0}")]
    Config(String),

    /// The identifier string is not a well-formed content identifier
    #[error("Invalid content identifier: {0}")]
    InvalidCid(#[from] cid::Error),

    /// The backing node did not respond within the configured duration
    #[error("Backing node did not respond within {after:?}")]
    Timeout { after: Duration },

    /// The operation was cancelled because the store was closed
    #[error("Store is closed")]
    Closed,

    /// Any other failure reported by the backing node, propagated verbatim
    #[error("Backing store error: {0}")]
    Backing(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
