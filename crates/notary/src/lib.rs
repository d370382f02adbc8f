//! # Notary
//!
//! A document-notarization registry. Each receiver owns an ordered,
//! append-only list of opaque documents, each stamped with the time it was
//! sent and, once, the time the receiver opened it.
//!
//! ## Overview
//!
//! - **Direct operations**: the caller is the acting party
//! - **Presigned operations**: a relayer submits an authorization the acting
//!   party signed off-band; each authorization executes at most once
//! - **Storage strategies**: a mapping layout keyed by logical key, or a
//!   segmented layout of pre-sized cells at derived addresses
//! - **Atomicity**: each operation commits as a single storage batch
//!
//! ## Usage
//!
//! ```rust,no_run
//! use notary::{Registry, RegistryConfig, StrategyKind};
//! use notary::core::{Keypair, ProgramId};
//! use notary::store::SqliteStorage;
//!
//! async fn example() {
//!     let storage = SqliteStorage::open("notary.db").unwrap();
//!     let config = RegistryConfig::default()
//!         .with_program_id(ProgramId::from_name("contracts"))
//!         .with_strategy(StrategyKind::Segmented);
//!     let registry = Registry::new(storage, config);
//!
//!     let sender = Keypair::generate();
//!     let receiver = Keypair::generate();
//!
//!     let index = registry
//!         .set_document(sender.identity(), receiver.identity(), b"ipfs://doc#sha256".to_vec())
//!         .await
//!         .unwrap();
//!
//!     registry
//!         .set_opened_at(receiver.identity(), receiver.identity(), index)
//!         .await
//!         .unwrap();
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `notary::core` - Identities, records, codec, signatures, addresses
//! - `notary::store` - Storage trait, SQLite and in-memory backends

pub mod clock;
pub mod config;
pub mod error;
pub mod event;
pub mod registry;
pub mod replay;
pub mod request;
pub mod strategy;
pub mod txn;

// Re-export component crates
pub use notary_core as core;
pub use notary_store as store;

// Re-export main types for convenience
pub use clock::{Clock, SystemClock};
pub use config::{RegistryConfig, StrategyKind};
pub use error::{RegistryError, Result};
pub use event::RegistryEvent;
pub use registry::Registry;
pub use replay::ReplayGuard;
pub use request::{PresignedRequest, SubmitOutcome};
pub use strategy::{MappingStrategy, SegmentedStrategy, StorageStrategy};

// Re-export commonly used core types
pub use notary_core::{Digest, Document, DocumentIndex, Identity, Keypair, ProgramId, Timestamp};
