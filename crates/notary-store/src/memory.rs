//! In-memory implementation of the Storage trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{Result, StoreError};
use crate::traits::{check_write, Storage, StorageKey, WriteBatch, WriteOp};

#[derive(Debug, Clone)]
struct StoredCell {
    /// `None` for unbounded logical keys.
    capacity: Option<usize>,
    data: Bytes,
}

/// In-memory storage implementation.
///
/// All data is lost when the storage is dropped. Thread-safe via RwLock; a
/// batch is applied under a single write lock.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: RwLock<BTreeMap<StorageKey, StoredCell>>,
}

impl MemoryStorage {
    /// Create a new empty in-memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    fn read_lock(&self) -> Result<RwLockReadGuard<'_, BTreeMap<StorageKey, StoredCell>>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn write_lock(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<StorageKey, StoredCell>>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn read(&self, key: &StorageKey) -> Result<Option<Bytes>> {
        let inner = self.read_lock()?;
        Ok(inner.get(key).map(|cell| cell.data.clone()))
    }

    async fn capacity(&self, key: &StorageKey) -> Result<Option<usize>> {
        let inner = self.read_lock()?;
        Ok(inner.get(key).and_then(|cell| cell.capacity))
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.read_lock()?.len())
    }

    async fn entries(&self) -> Result<Vec<(StorageKey, Bytes)>> {
        let inner = self.read_lock()?;
        let mut entries: Vec<(StorageKey, Bytes)> = inner
            .iter()
            .map(|(key, cell)| (*key, cell.data.clone()))
            .collect();
        entries.sort_by_cached_key(|(key, _)| key.to_bytes());
        Ok(entries)
    }

    async fn apply(&self, batch: WriteBatch) -> Result<()> {
        let mut inner = self.write_lock()?;

        // Stage every op first so a failure leaves the map untouched.
        let mut staged: BTreeMap<StorageKey, StoredCell> = BTreeMap::new();
        for op in batch.into_ops() {
            match op {
                WriteOp::Allocate { key, capacity } => {
                    if staged.contains_key(&key) || inner.contains_key(&key) {
                        return Err(StoreError::AlreadyAllocated(key.to_string()));
                    }
                    staged.insert(
                        key,
                        StoredCell {
                            capacity: Some(capacity),
                            data: Bytes::from(vec![0u8; capacity]),
                        },
                    );
                }
                WriteOp::Write { key, data } => {
                    let existing = staged
                        .get(&key)
                        .or_else(|| inner.get(&key))
                        .map(|cell| cell.capacity);
                    let capacity = check_write(&key, existing, data.len())?;
                    staged.insert(key, StoredCell { capacity, data });
                }
            }
        }

        inner.extend(staged);
        Ok(())
    }
}
