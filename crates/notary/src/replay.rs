//! Replay protection for presigned operations.
//!
//! Every executed authorization digest leaves a marker in storage. Markers
//! are written in the same transaction as the operation they authorize and
//! are never removed.

use std::sync::Arc;

use notary_core::Digest;
use notary_store::Storage;
use tracing::warn;

use crate::error::{RegistryError, Result};
use crate::strategy::StorageStrategy;
use crate::txn::Transaction;

/// Value stored in a replay marker.
pub const EXECUTED_MARKER: [u8; 1] = [1];

/// Tracks which authorization digests have been executed.
#[derive(Clone)]
pub struct ReplayGuard {
    strategy: Arc<dyn StorageStrategy>,
}

impl ReplayGuard {
    pub fn new(strategy: Arc<dyn StorageStrategy>) -> Self {
        Self { strategy }
    }

    /// Fail with `AlreadyExecuted` if `digest` was consumed, otherwise stage
    /// its marker in `tx`.
    pub async fn check_and_consume<S: Storage + ?Sized>(
        &self,
        tx: &mut Transaction<'_, S>,
        digest: &Digest,
    ) -> Result<()> {
        let key = self.strategy.replay_key(digest)?;
        if tx.read(&key).await?.is_some() {
            warn!(digest = %digest, "rejected replayed authorization");
            return Err(RegistryError::AlreadyExecuted(*digest));
        }
        tx.create(key, EXECUTED_MARKER.to_vec());
        Ok(())
    }

    /// Whether `digest` has been consumed by a committed operation.
    pub async fn is_consumed<S: Storage + ?Sized>(&self, storage: &S, digest: &Digest) -> Result<bool> {
        let key = self.strategy.replay_key(digest)?;
        Ok(storage.read(&key).await?.is_some())
    }
}
