//! Staged transactions.
//!
//! An operation reads through a transaction and stages every write in it.
//! Nothing reaches storage until [`Transaction::commit`], which hands the
//! staged writes over as one atomic batch. Dropping an uncommitted
//! transaction discards it.

use std::collections::BTreeMap;

use bytes::Bytes;
use notary_store::{Storage, StorageKey, WriteBatch};

use crate::error::Result;

pub struct Transaction<'a, S: Storage + ?Sized> {
    storage: &'a S,
    allocate_cells: bool,
    overlay: BTreeMap<StorageKey, Bytes>,
    batch: WriteBatch,
}

impl<'a, S: Storage + ?Sized> Transaction<'a, S> {
    /// Begin a transaction. With `allocate_cells`, records created through
    /// [`create`](Self::create) get a cell sized to their first value.
    pub fn new(storage: &'a S, allocate_cells: bool) -> Self {
        Self {
            storage,
            allocate_cells,
            overlay: BTreeMap::new(),
            batch: WriteBatch::new(),
        }
    }

    /// Read a value, seeing this transaction's own staged writes.
    pub async fn read(&self, key: &StorageKey) -> Result<Option<Bytes>> {
        if let Some(staged) = self.overlay.get(key) {
            return Ok(Some(staged.clone()));
        }
        Ok(self.storage.read(key).await?)
    }

    /// Stage a record that does not exist yet.
    pub fn create(&mut self, key: StorageKey, data: Vec<u8>) {
        if self.allocate_cells {
            self.batch.allocate(key, data.len());
        }
        self.stage(key, Bytes::from(data));
    }

    /// Stage a new value for an existing record.
    pub fn update(&mut self, key: StorageKey, data: Vec<u8>) {
        self.stage(key, Bytes::from(data));
    }

    fn stage(&mut self, key: StorageKey, data: Bytes) {
        self.batch.write(key, data.clone());
        self.overlay.insert(key, data);
    }

    /// Number of staged storage operations.
    pub fn pending(&self) -> usize {
        self.batch.len()
    }

    /// Apply every staged write atomically.
    pub async fn commit(self) -> Result<()> {
        if self.batch.is_empty() {
            return Ok(());
        }
        self.storage.apply(self.batch).await?;
        Ok(())
    }
}
