//! Notifications emitted after a mutation commits.

use notary_core::{DocumentIndex, Identity, Timestamp};
use serde::{Deserialize, Serialize};

/// A committed registry change.
///
/// Events are published in commit order. Subscribers that fall more than the
/// configured capacity behind miss events and observe a lag instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegistryEvent {
    /// A document was created.
    DocumentSet {
        sender: Identity,
        receiver: Identity,
        index: DocumentIndex,
        data: Vec<u8>,
        sent_at: Timestamp,
    },
    /// A document was opened by its receiver.
    OpenedAtSet {
        receiver: Identity,
        index: DocumentIndex,
        opened_at: Timestamp,
    },
}

impl RegistryEvent {
    /// Receiver whose documents changed.
    pub fn receiver(&self) -> &Identity {
        match self {
            Self::DocumentSet { receiver, .. } | Self::OpenedAtSet { receiver, .. } => receiver,
        }
    }

    /// Position of the affected document in the receiver's list.
    pub fn index(&self) -> DocumentIndex {
        match self {
            Self::DocumentSet { index, .. } | Self::OpenedAtSet { index, .. } => *index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_set_carries_payload() {
        let event = RegistryEvent::DocumentSet {
            sender: Identity::from_bytes([1; 32]),
            receiver: Identity::from_bytes([2; 32]),
            index: 4,
            data: b"ipfs://doc".to_vec(),
            sent_at: 9,
        };
        assert_eq!(event.index(), 4);
        assert_eq!(event.receiver(), &Identity::from_bytes([2; 32]));

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "document_set");
        assert_eq!(json["data"].as_array().map(Vec::len), Some(10));
    }
}
