//! Registry configuration.

use notary_core::ProgramId;
use serde::{Deserialize, Serialize};

/// How records are laid out in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// One associative store keyed by logical key.
    #[default]
    Mapping,
    /// Pre-sized cells at derived addresses.
    Segmented,
}

/// Configuration for the Registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Namespace mixed into cell addresses and authorization digests.
    pub program_id: ProgramId,
    /// Storage layout.
    pub strategy: StrategyKind,
    /// Buffered events per subscriber before slow receivers start lagging.
    pub event_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            program_id: ProgramId::default(),
            strategy: StrategyKind::Mapping,
            event_capacity: 256,
        }
    }
}

impl RegistryConfig {
    pub fn with_program_id(mut self, program_id: ProgramId) -> Self {
        self.program_id = program_id;
        self
    }

    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    /// Events buffered per subscriber. At least 1.
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }
}
