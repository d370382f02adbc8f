//! # Notary Core
//!
//! Pure primitives for the document notary: identities, records, the binary
//! codec, authorization payloads and cell address derivation.
//!
//! This crate contains no I/O, no storage, no networking.
//!
//! ## Key Types
//!
//! - [`Identity`] - A sender or receiver (Ed25519 verifying key)
//! - [`Document`] - One notarized payload with send and open times
//! - [`ReceiverDescriptor`] - Per-receiver document counter
//! - [`CreateAuthorization`] / [`OpenAuthorization`] - What presigned operations sign
//! - [`CellAddress`] - Derived address of a segmented storage cell
//!
//! ## Encoding
//!
//! Records and authorization payloads share one byte-exact little-endian
//! layout. See the [`codec`] module.

pub mod address;
pub mod auth;
pub mod codec;
pub mod crypto;
pub mod error;
pub mod record;
pub mod types;

pub use address::{
    create_cell_address, document_address, document_seed, find_cell_address, receiver_address,
    replay_address, CellAddress,
};
pub use auth::{CreateAuthorization, OpenAuthorization};
pub use codec::{Decode, Encode};
pub use crypto::{verify_signature, Digest, Keypair, Signature, SIGNATURE_LEN};
pub use error::{CoreError, Result};
pub use record::{Document, ReceiverDescriptor};
pub use types::{DocumentIndex, Identity, ProgramId, Timestamp, IDENTITY_LEN};
