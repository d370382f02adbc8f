//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use notary::{Clock, Registry, RegistryConfig, StrategyKind};
use notary_core::{Identity, Keypair, ProgramId, Timestamp};
use notary_store::{MemoryStorage, SqliteStorage, Storage};

/// Deployment name of the program id fixtures use.
pub const TEST_PROGRAM: &str = "notary-testkit";

/// Time a fresh [`ManualClock`] starts at (2023-11-14).
pub const START_TIME: Timestamp = 1_700_000_000;

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start)),
        }
    }

    pub fn set(&self, now: Timestamp) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Move forward by `secs` and return the new time.
    pub fn advance(&self, secs: u64) -> Timestamp {
        self.now.fetch_add(secs, Ordering::SeqCst) + secs
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(START_TIME)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}

/// A registry on a manual clock with a fixed program id.
pub struct TestFixture<S: Storage> {
    pub registry: Registry<S>,
    pub clock: ManualClock,
}

impl<S: Storage> TestFixture<S> {
    /// Build a fixture over any storage backend.
    pub fn with_storage(storage: S, strategy: StrategyKind) -> Self {
        let clock = ManualClock::default();
        let config = RegistryConfig::default()
            .with_program_id(program_id())
            .with_strategy(strategy);
        Self {
            registry: Registry::with_clock(storage, config, clock.clone()),
            clock,
        }
    }

    pub fn program_id(&self) -> &ProgramId {
        self.registry.program_id()
    }
}

impl TestFixture<MemoryStorage> {
    pub fn memory(strategy: StrategyKind) -> Self {
        Self::with_storage(MemoryStorage::new(), strategy)
    }
}

impl TestFixture<SqliteStorage> {
    /// In-memory SQLite; use [`TestFixture::with_storage`] for a file.
    pub fn sqlite(strategy: StrategyKind) -> Self {
        match SqliteStorage::open_memory() {
            Ok(storage) => Self::with_storage(storage, strategy),
            Err(e) => panic!("in-memory sqlite failed to open: {e}"),
        }
    }
}

/// Program id shared by all fixtures.
pub fn program_id() -> ProgramId {
    ProgramId::from_name(TEST_PROGRAM)
}

/// Deterministic keypairs for multi-party tests.
pub fn parties(count: usize) -> Vec<Keypair> {
    (0..count)
        .map(|i| {
            let mut seed = [0u8; 32];
            seed[0] = i as u8;
            seed[1] = 0xa5;
            Keypair::from_seed(&seed)
        })
        .collect()
}

/// A sender and a receiver, in that order.
pub fn sender_and_receiver() -> (Keypair, Keypair) {
    let mut pair = parties(2);
    let receiver = pair.remove(1);
    let sender = pair.remove(0);
    (sender, receiver)
}

/// An identity that is not a valid curve point, so it can never sign.
pub fn unsignable_identity() -> Identity {
    // Roughly half of all 32-byte strings do not decompress.
    let mut bytes = [0x5a; 32];
    for candidate in 0u8..=255 {
        bytes[0] = candidate;
        if !Identity::is_on_curve(&bytes) {
            return Identity::from_bytes(bytes);
        }
    }
    Identity::from_bytes(bytes)
}
