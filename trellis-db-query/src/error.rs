//! Error types for query execution

use thiserror::Error;
use trellis_db_core::{CancelledError, MemoryExceededError};

/// Query execution errors
#[derive(Error, Debug)]
pub enum QueryError {
    /// Zero-length path over two unconstrained variables.
    ///
    /// Evaluating the empty path would have to enumerate every node of the
    /// graph, which this operator does not support.
    #[error("This query might have to evaluate the empty path, which is not supported")]
    UnsupportedEmptyPath,

    /// Cancellation flag observed in a hot loop
    #[error(transparent)]
    Cancelled(#[from] CancelledError),

    /// Tracked allocation exceeded the global memory limit
    #[error(transparent)]
    MemoryExceeded(#[from] MemoryExceededError),

    /// Invalid query shape
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Internal consistency violation (indicates a bug)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl QueryError {
    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        QueryError::Internal(msg.into())
    }
}

/// Result type for query operations
pub type Result<T> = std::result::Result<T, QueryError>;
