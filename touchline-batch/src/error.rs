//! Error types for touchline-batch

use thiserror::Error;

/// Error type for store and batch operations
#[derive(Debug, Error)]
pub enum BatchError {
    /// Journey store or result sink failed
    #[error("Store error: {0}")]
    Store(String),
}

/// Result type alias for batch operations
pub type Result<T> = std::result::Result<T, BatchError>;
