//! Storage trait: the abstract interface for cell persistence.
//!
//! This trait allows the registry to be storage-agnostic. Implementations
//! include SQLite (primary) and in-memory (for tests).

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use notary_core::{CellAddress, Digest, DocumentIndex, Identity};

use crate::error::{Result, StoreError};

/// Location of one stored value.
///
/// The mapping strategy addresses records by their logical key. The segmented
/// strategy only ever uses [`StorageKey::Cell`], whose cells must be
/// allocated before they are written.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StorageKey {
    /// Descriptor of a receiver.
    Receiver(Identity),
    /// One document of a receiver.
    Document {
        receiver: Identity,
        index: DocumentIndex,
    },
    /// Marker for an executed authorization digest.
    Replay(Digest),
    /// A pre-sized cell at a derived address.
    Cell(CellAddress),
}

impl StorageKey {
    const TAG_RECEIVER: u8 = 1;
    const TAG_DOCUMENT: u8 = 2;
    const TAG_REPLAY: u8 = 3;
    const TAG_CELL: u8 = 4;

    /// One-byte discriminator used as the key prefix.
    pub fn tag(&self) -> u8 {
        match self {
            Self::Receiver(_) => Self::TAG_RECEIVER,
            Self::Document { .. } => Self::TAG_DOCUMENT,
            Self::Replay(_) => Self::TAG_REPLAY,
            Self::Cell(_) => Self::TAG_CELL,
        }
    }

    /// Whether writes to this key require a prior allocation.
    pub fn is_cell(&self) -> bool {
        matches!(self, Self::Cell(_))
    }

    /// Flat byte form: tag followed by the key material.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(37);
        out.push(self.tag());
        match self {
            Self::Receiver(id) => out.extend_from_slice(id.as_bytes()),
            Self::Document { receiver, index } => {
                out.extend_from_slice(receiver.as_bytes());
                out.extend_from_slice(&index.to_le_bytes());
            }
            Self::Replay(digest) => out.extend_from_slice(digest.as_bytes()),
            Self::Cell(address) => out.extend_from_slice(address.as_bytes()),
        }
        out
    }

    /// Parse the flat byte form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let invalid = || StoreError::InvalidData(format!("bad storage key of {} bytes", bytes.len()));
        let (&tag, rest) = bytes.split_first().ok_or_else(invalid)?;
        let key32 = |slice: &[u8]| -> Result<[u8; 32]> { slice.try_into().map_err(|_| invalid()) };

        match tag {
            Self::TAG_RECEIVER => Ok(Self::Receiver(Identity(key32(rest)?))),
            Self::TAG_DOCUMENT => {
                if rest.len() != 36 {
                    return Err(invalid());
                }
                let receiver = Identity(key32(&rest[..32])?);
                let index = u32::from_le_bytes(rest[32..].try_into().map_err(|_| invalid())?);
                Ok(Self::Document { receiver, index })
            }
            Self::TAG_REPLAY => Ok(Self::Replay(Digest(key32(rest)?))),
            Self::TAG_CELL => Ok(Self::Cell(CellAddress(key32(rest)?))),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Debug for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Receiver(id) => write!(f, "Receiver({id})"),
            Self::Document { receiver, index } => write!(f, "Document({receiver}/{index})"),
            Self::Replay(digest) => write!(f, "Replay({digest})"),
            Self::Cell(address) => write!(f, "Cell({address})"),
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One operation inside a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Create a zero-filled cell of `capacity` bytes. Fails if the key exists.
    Allocate { key: StorageKey, capacity: usize },
    /// Replace the value stored under `key`.
    Write { key: StorageKey, data: Bytes },
}

impl WriteOp {
    /// Key the operation targets.
    pub fn key(&self) -> &StorageKey {
        match self {
            Self::Allocate { key, .. } | Self::Write { key, .. } => key,
        }
    }
}

/// An ordered set of writes applied all-or-nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an allocation.
    pub fn allocate(&mut self, key: StorageKey, capacity: usize) -> &mut Self {
        self.ops.push(WriteOp::Allocate { key, capacity });
        self
    }

    /// Queue a write.
    pub fn write(&mut self, key: StorageKey, data: impl Into<Bytes>) -> &mut Self {
        self.ops.push(WriteOp::Write {
            key,
            data: data.into(),
        });
        self
    }

    /// Number of queued operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Queued operations, in application order.
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    /// Consume the batch, yielding its operations in order.
    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

/// Check a write against what is already known about its key.
///
/// `existing` is `None` when the key does not exist, otherwise the key's
/// capacity (`None` for unbounded logical keys). Returns the capacity the
/// key keeps after the write.
pub(crate) fn check_write(
    key: &StorageKey,
    existing: Option<Option<usize>>,
    len: usize,
) -> Result<Option<usize>> {
    match existing {
        None if key.is_cell() => Err(StoreError::Unallocated(key.to_string())),
        None => Ok(None),
        Some(Some(capacity)) if len > capacity => Err(StoreError::CapacityExceeded {
            key: key.to_string(),
            capacity,
            len,
        }),
        Some(capacity) => Ok(capacity),
    }
}

/// The Storage trait: async interface for cell persistence.
///
/// All methods are async to support both sync (SQLite) and async backends.
/// For SQLite, we use `spawn_blocking` internally to avoid blocking the runtime.
///
/// # Design Notes
///
/// - **Atomic batches**: `apply` either performs every operation in the batch
///   or none of them. Operations are checked in order, so a batch may
///   allocate a cell and then write it.
/// - **Allocation**: allocating an existing key fails, and a cell can never
///   hold more bytes than it was allocated with.
#[async_trait]
pub trait Storage: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────────

    /// Read the value stored under `key`.
    async fn read(&self, key: &StorageKey) -> Result<Option<Bytes>>;

    /// Allocated size of a cell. `None` if the key is absent or unbounded.
    async fn capacity(&self, key: &StorageKey) -> Result<Option<usize>>;

    /// Number of stored keys.
    async fn len(&self) -> Result<usize>;

    /// Every stored key and value, ordered by the key's byte form.
    async fn entries(&self) -> Result<Vec<(StorageKey, Bytes)>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────────────────────────────────

    /// Apply a batch atomically.
    async fn apply(&self, batch: WriteBatch) -> Result<()>;
}
