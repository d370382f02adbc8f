//! # Notary Store
//!
//! Storage abstraction for the document notary. Provides a trait-based
//! interface for cell persistence with SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! The registry never talks to a database directly. It reads encoded records
//! by [`StorageKey`] and commits each operation as one [`WriteBatch`], which
//! every backend applies all-or-nothing.
//!
//! ## Key Types
//!
//! - [`Storage`] - The async trait for all storage operations
//! - [`SqliteStorage`] - SQLite-based persistent storage
//! - [`MemoryStorage`] - In-memory storage for tests
//! - [`StorageKey`] - Logical key or derived cell address
//! - [`WriteBatch`] - Ordered allocations and writes applied atomically
//!
//! ## Usage
//!
//! ```rust,no_run
//! use notary_store::{SqliteStorage, Storage, StorageKey, WriteBatch};
//! use notary_core::Identity;
//!
//! async fn example() {
//!     let storage = SqliteStorage::open("notary.db").unwrap();
//!
//!     let key = StorageKey::Receiver(Identity::from_bytes([1; 32]));
//!     let mut batch = WriteBatch::new();
//!     batch.write(key, vec![0, 0, 0, 0]);
//!     storage.apply(batch).await.unwrap();
//!
//!     let stored = storage.read(&key).await.unwrap();
//!     assert!(stored.is_some());
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Atomic batches**: a failing operation rolls back the whole batch
//! - **Allocation**: derived cells are allocated once with a fixed capacity
//! - **Logical keys**: mapping entries need no allocation and are unbounded

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageKey, WriteBatch, WriteOp};
