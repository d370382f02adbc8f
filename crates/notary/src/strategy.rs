//! Storage strategies: where each record lives.
//!
//! The registry logic is the same under both strategies. Only key resolution
//! and cell allocation differ.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use notary_core::{
    document_address, receiver_address, replay_address, CellAddress, Digest, DocumentIndex,
    Identity, ProgramId,
};
use notary_store::StorageKey;
use tracing::debug;

use crate::config::StrategyKind;
use crate::error::Result;

/// Resolves logical records to storage keys.
pub trait StorageStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Key of a receiver's descriptor.
    fn receiver_key(&self, receiver: &Identity) -> Result<StorageKey>;

    /// Key of document `index` of `receiver`.
    fn document_key(&self, receiver: &Identity, index: DocumentIndex) -> Result<StorageKey>;

    /// Key of the marker recording that `digest` was executed.
    fn replay_key(&self, digest: &Digest) -> Result<StorageKey>;

    /// Whether new records need a sized allocation before their first write.
    fn requires_allocation(&self) -> bool;
}

/// Build the strategy named by `kind`.
pub fn build(kind: StrategyKind, program: ProgramId) -> Arc<dyn StorageStrategy> {
    match kind {
        StrategyKind::Mapping => Arc::new(MappingStrategy),
        StrategyKind::Segmented => Arc::new(SegmentedStrategy::new(program)),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Mapping
// ─────────────────────────────────────────────────────────────────────────────

/// Records keyed directly by their logical key.
#[derive(Debug, Clone, Copy, Default)]
pub struct MappingStrategy;

impl StorageStrategy for MappingStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Mapping
    }

    fn receiver_key(&self, receiver: &Identity) -> Result<StorageKey> {
        Ok(StorageKey::Receiver(*receiver))
    }

    fn document_key(&self, receiver: &Identity, index: DocumentIndex) -> Result<StorageKey> {
        Ok(StorageKey::Document {
            receiver: *receiver,
            index,
        })
    }

    fn replay_key(&self, digest: &Digest) -> Result<StorageKey> {
        Ok(StorageKey::Replay(*digest))
    }

    fn requires_allocation(&self) -> bool {
        false
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Segmented
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum CellName {
    Receiver(Identity),
    Document(Identity, DocumentIndex),
    Replay(Digest),
}

/// Records in pre-sized cells at derived addresses.
///
/// Address searches are cached; a result never changes for a given program.
#[derive(Debug)]
pub struct SegmentedStrategy {
    program: ProgramId,
    cache: RwLock<HashMap<CellName, (CellAddress, u8)>>,
}

impl SegmentedStrategy {
    pub fn new(program: ProgramId) -> Self {
        Self {
            program,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Program the addresses are derived under.
    pub fn program_id(&self) -> &ProgramId {
        &self.program
    }

    /// Descriptor cell address and bump of `receiver`.
    pub fn receiver_address(&self, receiver: &Identity) -> Result<(CellAddress, u8)> {
        self.resolve(CellName::Receiver(*receiver))
    }

    /// Cell address and bump of document `index` of `receiver`.
    pub fn document_address(
        &self,
        receiver: &Identity,
        index: DocumentIndex,
    ) -> Result<(CellAddress, u8)> {
        self.resolve(CellName::Document(*receiver, index))
    }

    /// Replay marker cell address and bump of `digest`.
    pub fn replay_address(&self, digest: &Digest) -> Result<(CellAddress, u8)> {
        self.resolve(CellName::Replay(*digest))
    }

    /// Number of cached address searches.
    pub fn cached(&self) -> usize {
        self.cache.read().map(|cache| cache.len()).unwrap_or(0)
    }

    fn resolve(&self, name: CellName) -> Result<(CellAddress, u8)> {
        if let Some(found) = self
            .cache
            .read()
            .ok()
            .and_then(|cache| cache.get(&name).copied())
        {
            return Ok(found);
        }

        let found = match name {
            CellName::Receiver(receiver) => receiver_address(&receiver, &self.program)?,
            CellName::Document(receiver, index) => {
                document_address(&receiver, index, &self.program)?
            }
            CellName::Replay(digest) => replay_address(&digest, &self.program)?,
        };

        // A poisoned cache only costs a recomputation next time.
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(name, found);
        }
        debug!(?name, address = %found.0, bump = found.1, "cached cell address");
        Ok(found)
    }
}

impl StorageStrategy for SegmentedStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Segmented
    }

    fn receiver_key(&self, receiver: &Identity) -> Result<StorageKey> {
        Ok(StorageKey::Cell(self.receiver_address(receiver)?.0))
    }

    fn document_key(&self, receiver: &Identity, index: DocumentIndex) -> Result<StorageKey> {
        Ok(StorageKey::Cell(self.document_address(receiver, index)?.0))
    }

    fn replay_key(&self, digest: &Digest) -> Result<StorageKey> {
        Ok(StorageKey::Cell(self.replay_address(digest)?.0))
    }

    fn requires_allocation(&self) -> bool {
        true
    }
}
