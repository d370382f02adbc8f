//! Deterministic cell addresses for segmented storage.
//!
//! A cell address is a Blake3 hash over a seed list, a one-byte bump, the
//! program id and a fixed marker. Addresses that decode as an Ed25519 curve
//! point are reserved (someone could hold the key for them), so derivation
//! searches bumps from 255 down to 0 and keeps the first non-reserved result.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::crypto::Digest;
use crate::error::{CoreError, Result};
use crate::types::{DocumentIndex, Identity, ProgramId};

/// Trailing marker hashed into every derived address.
pub const CELL_MARKER: &[u8] = b"notary-derived-cell";

/// Seed naming a receiver's descriptor cell.
pub const RECEIVER_SEED: &[u8] = b"receiver";

/// Suffix of the seed naming a document cell.
pub const DOCUMENT_SEED_SUFFIX: &str = "document";

/// Seed naming a replay marker cell.
pub const EXECUTED_SEED: &[u8] = b"executed";

/// Address of one segmented storage cell.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellAddress(pub [u8; 32]);

impl CellAddress {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Whether the address falls in the reserved class.
    pub fn is_reserved(&self) -> bool {
        Identity::is_on_curve(&self.0)
    }
}

impl fmt::Debug for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CellAddress({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

fn hash_cell(seeds: &[&[u8]], bump: u8, program: &ProgramId) -> CellAddress {
    let mut hasher = blake3::Hasher::new();
    for seed in seeds {
        hasher.update(seed);
    }
    hasher.update(&[bump]);
    hasher.update(program.as_bytes());
    hasher.update(CELL_MARKER);
    CellAddress(*hasher.finalize().as_bytes())
}

/// Derive the address for a known bump.
///
/// Returns `None` when the result is reserved. Used to re-check a bump that
/// was found earlier by [`find_cell_address`].
pub fn create_cell_address(seeds: &[&[u8]], bump: u8, program: &ProgramId) -> Option<CellAddress> {
    let address = hash_cell(seeds, bump, program);
    (!address.is_reserved()).then_some(address)
}

/// Search for the first non-reserved address, bump 255 first.
///
/// At most 256 candidates are tried.
pub fn find_cell_address(seeds: &[&[u8]], program: &ProgramId) -> Result<(CellAddress, u8)> {
    find_with(seeds, program, CellAddress::is_reserved)
}

fn find_with(
    seeds: &[&[u8]],
    program: &ProgramId,
    is_reserved: impl Fn(&CellAddress) -> bool,
) -> Result<(CellAddress, u8)> {
    for bump in (0..=u8::MAX).rev() {
        let address = hash_cell(seeds, bump, program);
        if !is_reserved(&address) {
            debug!(address = %address, bump, "derived cell address");
            return Ok((address, bump));
        }
    }
    let described: Vec<String> = seeds.iter().map(hex::encode).collect();
    Err(CoreError::AllocationFailure(described.join("/")))
}

/// Seed for document `index`: its decimal form followed by `"document"`.
pub fn document_seed(index: DocumentIndex) -> Vec<u8> {
    format!("{index}{DOCUMENT_SEED_SUFFIX}").into_bytes()
}

/// Address of a receiver's descriptor cell.
pub fn receiver_address(receiver: &Identity, program: &ProgramId) -> Result<(CellAddress, u8)> {
    let seeds: [&[u8]; 2] = [receiver.as_bytes(), RECEIVER_SEED];
    find_cell_address(&seeds, program)
}

/// Address of the cell holding document `index` of `receiver`.
pub fn document_address(
    receiver: &Identity,
    index: DocumentIndex,
    program: &ProgramId,
) -> Result<(CellAddress, u8)> {
    let seed = document_seed(index);
    let seeds: [&[u8]; 2] = [receiver.as_bytes(), &seed];
    find_cell_address(&seeds, program)
}

/// Address of the marker cell recording that `digest` was executed.
pub fn replay_address(digest: &Digest, program: &ProgramId) -> Result<(CellAddress, u8)> {
    let seeds: [&[u8]; 2] = [digest.as_bytes(), EXECUTED_SEED];
    find_cell_address(&seeds, program)
}
