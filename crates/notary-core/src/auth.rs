//! Authorization payloads for presigned operations.
//!
//! A signer encodes the payload, hashes it under a domain tag and the
//! registry's program id, and signs the digest. The same digest doubles as the
//! replay key once the operation has been executed.

use bytes::{Buf, BufMut};

use crate::codec::{Decode, Encode, LEN_PREFIX};
use crate::crypto::{Digest, Keypair, Signature};
use crate::error::Result;
use crate::types::{DocumentIndex, Identity, ProgramId, IDENTITY_LEN};

/// Domain tag for document creation digests.
pub const CREATE_DOMAIN: &[u8] = b"notary-create-v1:";

/// Domain tag for document opening digests.
pub const OPEN_DOMAIN: &[u8] = b"notary-open-v1:";

fn tagged_digest(domain: &[u8], program: &ProgramId, payload: &[u8]) -> Digest {
    Digest::hash_parts(&[domain, program.as_bytes(), payload])
}

/// Authorization for creating a document on behalf of `sender`.
///
/// The index is not part of the payload: the registry assigns it at commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAuthorization {
    pub sender: Identity,
    pub receiver: Identity,
    pub data: Vec<u8>,
    pub nonce: u64,
}

impl CreateAuthorization {
    /// Authorize `receiver` to get `data` from `sender`, once per `nonce`.
    pub fn new(sender: Identity, receiver: Identity, data: Vec<u8>, nonce: u64) -> Self {
        Self {
            sender,
            receiver,
            data,
            nonce,
        }
    }

    /// Digest the sender signs, scoped to one registry.
    pub fn digest(&self, program: &ProgramId) -> Digest {
        tagged_digest(CREATE_DOMAIN, program, &self.encode_to_vec())
    }

    /// Sign this authorization. The keypair should belong to `sender`.
    pub fn sign(&self, program: &ProgramId, keypair: &Keypair) -> Signature {
        keypair.sign(&self.digest(program))
    }
}

impl Encode for CreateAuthorization {
    fn encode_to<B: BufMut>(&self, buf: &mut B) {
        self.sender.encode_to(buf);
        self.receiver.encode_to(buf);
        self.data.encode_to(buf);
        self.nonce.encode_to(buf);
    }

    fn encoded_len(&self) -> usize {
        IDENTITY_LEN * 2 + LEN_PREFIX + self.data.len() + 8
    }
}

impl Decode for CreateAuthorization {
    fn decode_from<B: Buf>(buf: &mut B) -> Result<Self> {
        Ok(Self {
            sender: Identity::decode_from(buf)?,
            receiver: Identity::decode_from(buf)?,
            data: Vec::<u8>::decode_from(buf)?,
            nonce: u64::decode_from(buf)?,
        })
    }
}

/// Authorization for opening document `index` of `receiver`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenAuthorization {
    pub receiver: Identity,
    pub index: DocumentIndex,
    pub nonce: u64,
}

impl OpenAuthorization {
    /// Encoded size of an opening payload.
    pub const ENCODED_LEN: usize = IDENTITY_LEN + 4 + 8;

    /// Authorize opening document `index` of `receiver`.
    pub fn new(receiver: Identity, index: DocumentIndex, nonce: u64) -> Self {
        Self {
            receiver,
            index,
            nonce,
        }
    }

    /// Digest the receiver signs, scoped to one registry.
    pub fn digest(&self, program: &ProgramId) -> Digest {
        tagged_digest(OPEN_DOMAIN, program, &self.encode_to_vec())
    }

    /// Sign this authorization. The keypair should belong to `receiver`.
    pub fn sign(&self, program: &ProgramId, keypair: &Keypair) -> Signature {
        keypair.sign(&self.digest(program))
    }
}

impl Encode for OpenAuthorization {
    fn encode_to<B: BufMut>(&self, buf: &mut B) {
        self.receiver.encode_to(buf);
        self.index.encode_to(buf);
        self.nonce.encode_to(buf);
    }

    fn encoded_len(&self) -> usize {
        Self::ENCODED_LEN
    }
}

impl Decode for OpenAuthorization {
    fn decode_from<B: Buf>(buf: &mut B) -> Result<Self> {
        Ok(Self {
            receiver: Identity::decode_from(buf)?,
            index: u32::decode_from(buf)?,
            nonce: u64::decode_from(buf)?,
        })
    }
}
