//! SQLite implementation of the Storage trait.
//!
//! This is the primary storage backend for the notary. It uses rusqlite with
//! bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use bytes::Bytes;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{check_write, Storage, StorageKey, WriteBatch, WriteOp};

/// SQLite-based storage implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime. A batch runs in one SQL transaction.
pub struct SqliteStorage {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = lock(&conn)?;
            f(&mut *guard)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|e| StoreError::Poisoned(format!("mutex poisoned: {}", e)))
}

/// Existing capacity of a key inside a transaction.
///
/// Outer `None`: the key does not exist. Inner `None`: unbounded logical key.
fn existing_capacity(tx: &Transaction<'_>, key: &[u8]) -> Result<Option<Option<usize>>> {
    let row: Option<Option<i64>> = tx
        .query_row(
            "SELECT capacity FROM cells WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()?;
    row.map(|capacity| capacity.map(to_usize).transpose())
        .transpose()
}

fn to_usize(value: i64) -> Result<usize> {
    usize::try_from(value).map_err(|_| StoreError::InvalidData(format!("negative size {value}")))
}

fn to_i64(value: usize) -> Result<i64> {
    i64::try_from(value).map_err(|_| StoreError::InvalidData(format!("size {value} out of range")))
}

fn apply_op(tx: &Transaction<'_>, op: WriteOp, now: i64) -> Result<()> {
    match op {
        WriteOp::Allocate { key, capacity } => {
            let raw = key.to_bytes();
            if existing_capacity(tx, &raw)?.is_some() {
                return Err(StoreError::AlreadyAllocated(key.to_string()));
            }
            tx.execute(
                "INSERT INTO cells (key, kind, capacity, data, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![raw, key.tag(), to_i64(capacity)?, vec![0u8; capacity], now],
            )?;
        }
        WriteOp::Write { key, data } => {
            let raw = key.to_bytes();
            let existing = existing_capacity(tx, &raw)?;
            let capacity = check_write(&key, existing, data.len())?
                .map(to_i64)
                .transpose()?;
            tx.execute(
                "INSERT INTO cells (key, kind, capacity, data, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(key) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
                params![raw, key.tag(), capacity, data.as_ref(), now],
            )?;
        }
    }
    Ok(())
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn read(&self, key: &StorageKey) -> Result<Option<Bytes>> {
        let raw = key.to_bytes();
        self.blocking(move |conn| {
            let data: Option<Vec<u8>> = conn
                .query_row(
                    "SELECT data FROM cells WHERE key = ?1",
                    params![raw],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(data.map(Bytes::from))
        })
        .await
    }

    async fn capacity(&self, key: &StorageKey) -> Result<Option<usize>> {
        let raw = key.to_bytes();
        self.blocking(move |conn| {
            let capacity: Option<Option<i64>> = conn
                .query_row(
                    "SELECT capacity FROM cells WHERE key = ?1",
                    params![raw],
                    |row| row.get(0),
                )
                .optional()?;
            capacity.flatten().map(to_usize).transpose()
        })
        .await
    }

    async fn len(&self) -> Result<usize> {
        self.blocking(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM cells", [], |row| row.get(0))?;
            to_usize(count)
        })
        .await
    }

    async fn entries(&self) -> Result<Vec<(StorageKey, Bytes)>> {
        self.blocking(|conn| {
            let mut stmt = conn.prepare("SELECT key, data FROM cells ORDER BY key")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, Vec<u8>>(1)?))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            rows.into_iter()
                .map(|(key, data)| Ok((StorageKey::from_bytes(&key)?, Bytes::from(data))))
                .collect()
        })
        .await
    }

    async fn apply(&self, batch: WriteBatch) -> Result<()> {
        let ops = batch.len();
        self.blocking(move |conn| {
            let tx = conn.transaction()?;
            let now = now_millis();
            for op in batch.into_ops() {
                apply_op(&tx, op, now)?;
            }
            tx.commit()?;
            Ok(())
        })
        .await?;
        debug!(ops, "applied write batch");
        Ok(())
    }
}

/// Get current time in milliseconds.
pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
