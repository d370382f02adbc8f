//! Error types for the notary core.

use thiserror::Error;

/// Core errors raised by the codec, the signature verifier and address derivation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A buffer could not be decoded into the requested record.
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// A signature had the wrong length or shape to be checked at all.
    #[error("invalid signature encoding: expected 64 bytes, got {0}")]
    InvalidSignatureEncoding(usize),

    /// Every bump in the search space produced a reserved address.
    #[error("address derivation exhausted for seed {0:?}")]
    AllocationFailure(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
