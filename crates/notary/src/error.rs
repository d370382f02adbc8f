//! Error types for the registry.

use notary_core::{CoreError, Digest, DocumentIndex, Identity, Timestamp};
use notary_store::StoreError;
use thiserror::Error;

/// Errors that can occur during registry operations.
///
/// Every variant has a stable numeric [`code`](RegistryError::code) for
/// callers that surface failures across a process boundary.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No document exists at this position.
    #[error("document not found: receiver {receiver} index {index}")]
    DocumentNotFound {
        receiver: Identity,
        index: DocumentIndex,
    },

    /// The caller may not act on the receiver's documents.
    #[error("caller {caller} is not receiver {receiver}")]
    Unauthorized { caller: Identity, receiver: Identity },

    /// The document already has an opening time.
    #[error("document {index} of {receiver} already opened at {opened_at}")]
    AlreadyOpened {
        receiver: Identity,
        index: DocumentIndex,
        opened_at: Timestamp,
    },

    /// The signature does not verify against the claimed signer.
    #[error("signature is not valid for signer {signer}")]
    InvalidSignature { signer: Identity },

    /// The signature bytes have the wrong length.
    #[error("invalid signature encoding: expected 64 bytes, got {0}")]
    InvalidSignatureEncoding(usize),

    /// This authorization digest has already been executed.
    #[error("authorization {0} was already executed")]
    AlreadyExecuted(Digest),

    /// A stored record or a payload could not be encoded or decoded.
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// No usable cell address or index was left.
    #[error("allocation failure: {0}")]
    AllocationFailure(String),

    /// A wire request could not be decoded.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl RegistryError {
    /// Stable numeric code of this error kind.
    pub fn code(&self) -> u32 {
        match self {
            Self::DocumentNotFound { .. } => 1,
            Self::Unauthorized { .. } => 2,
            Self::AlreadyOpened { .. } => 3,
            Self::InvalidSignature { .. } => 4,
            Self::InvalidSignatureEncoding(_) => 5,
            Self::AlreadyExecuted(_) => 6,
            Self::MalformedRecord(_) => 7,
            Self::AllocationFailure(_) => 8,
            Self::InvalidRequest(_) => 9,
            Self::Store(_) => 100,
        }
    }
}

impl From<CoreError> for RegistryError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::MalformedRecord(msg) => Self::MalformedRecord(msg),
            CoreError::InvalidSignatureEncoding(len) => Self::InvalidSignatureEncoding(len),
            CoreError::AllocationFailure(msg) => Self::AllocationFailure(msg),
        }
    }
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
