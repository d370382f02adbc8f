//! Persisted records: documents and receiver descriptors.

use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};

use crate::codec::{Decode, Encode, LEN_PREFIX};
use crate::error::Result;
use crate::types::{DocumentIndex, Identity, Timestamp, IDENTITY_LEN};

/// Per-receiver metadata.
///
/// `documents_counter` is the number of documents ever created for the
/// receiver, which is also the index the next document will get.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiverDescriptor {
    pub documents_counter: u32,
}

impl ReceiverDescriptor {
    /// Encoded size of a descriptor cell.
    pub const ENCODED_LEN: usize = 4;

    /// A descriptor for a receiver with no documents yet.
    pub const fn new() -> Self {
        Self {
            documents_counter: 0,
        }
    }

    /// Whether a document with this index has been created.
    pub fn contains(&self, index: DocumentIndex) -> bool {
        index < self.documents_counter
    }
}

impl Encode for ReceiverDescriptor {
    fn encode_to<B: BufMut>(&self, buf: &mut B) {
        self.documents_counter.encode_to(buf);
    }

    fn encoded_len(&self) -> usize {
        Self::ENCODED_LEN
    }
}

impl Decode for ReceiverDescriptor {
    fn decode_from<B: Buf>(buf: &mut B) -> Result<Self> {
        Ok(Self {
            documents_counter: u32::decode_from(buf)?,
        })
    }
}

/// One notarized document.
///
/// `opened_at == 0` means the receiver has not opened it yet. Once set to a
/// non-zero value it never changes again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// The party that produced the document.
    pub sender: Identity,
    /// Opaque payload, typically a link plus a checksum.
    pub data: Vec<u8>,
    /// When the document was created.
    pub sent_at: Timestamp,
    /// When the receiver opened it, or 0.
    pub opened_at: Timestamp,
}

impl Document {
    /// Fixed part of the encoding: sender, length prefix and two timestamps.
    pub const FIXED_LEN: usize = IDENTITY_LEN + LEN_PREFIX + 8 + 8;

    /// A freshly sent, unopened document.
    pub fn new(sender: Identity, data: Vec<u8>, sent_at: Timestamp) -> Self {
        Self {
            sender,
            data,
            sent_at,
            opened_at: 0,
        }
    }

    /// Encoded size of a document carrying `data_len` payload bytes.
    pub const fn size_for(data_len: usize) -> usize {
        Self::FIXED_LEN + data_len
    }

    /// Whether the receiver has opened this document.
    pub fn is_opened(&self) -> bool {
        self.opened_at != 0
    }
}

impl Encode for Document {
    fn encode_to<B: BufMut>(&self, buf: &mut B) {
        self.sender.encode_to(buf);
        self.data.encode_to(buf);
        self.sent_at.encode_to(buf);
        self.opened_at.encode_to(buf);
    }

    fn encoded_len(&self) -> usize {
        Self::size_for(self.data.len())
    }
}

impl Decode for Document {
    fn decode_from<B: Buf>(buf: &mut B) -> Result<Self> {
        let sender = Identity::decode_from(buf)?;
        let data = Vec::<u8>::decode_from(buf)?;
        let sent_at = u64::decode_from(buf)?;
        let opened_at = u64::decode_from(buf)?;
        Ok(Self {
            sender,
            data,
            sent_at,
            opened_at,
        })
    }
}
