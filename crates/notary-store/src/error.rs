//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A cell was allocated twice.
    #[error("cell already allocated: {0}")]
    AlreadyAllocated(String),

    /// A segmented cell was written before it was allocated.
    #[error("cell not allocated: {0}")]
    Unallocated(String),

    /// A write did not fit in the cell's allocated size.
    #[error("write of {len} bytes exceeds capacity {capacity} of {key}")]
    CapacityExceeded {
        key: String,
        capacity: usize,
        len: usize,
    },

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A lock guarding the backend was poisoned by a panicking writer.
    #[error("storage lock poisoned: {0}")]
    Poisoned(String),

    /// A blocking storage task failed to complete.
    #[error("storage task failed: {0}")]
    Task(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
