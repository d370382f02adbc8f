//! Wire form of presigned operations.
//!
//! A signer builds a request off-band and hands it to any relayer, which
//! forwards it as CBOR. The registry re-derives the digest from the request
//! fields, so a relayer cannot alter anything without breaking the signature.

use notary_core::{
    CreateAuthorization, Digest, DocumentIndex, Identity, Keypair, OpenAuthorization, ProgramId,
    Timestamp,
};
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};

/// A presigned operation as submitted by a relayer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PresignedRequest {
    /// Create a document on behalf of `sender`.
    Create {
        sender: Identity,
        receiver: Identity,
        data: Vec<u8>,
        nonce: u64,
        signature: Vec<u8>,
    },
    /// Open a document on behalf of `receiver`.
    Open {
        receiver: Identity,
        index: DocumentIndex,
        nonce: u64,
        signature: Vec<u8>,
    },
}

impl PresignedRequest {
    /// Sign a creation request as `sender`.
    pub fn sign_create(
        program: &ProgramId,
        sender: &Keypair,
        receiver: Identity,
        data: Vec<u8>,
        nonce: u64,
    ) -> Self {
        let auth = CreateAuthorization::new(sender.identity(), receiver, data, nonce);
        let signature = auth.sign(program, sender);
        Self::Create {
            sender: auth.sender,
            receiver: auth.receiver,
            data: auth.data,
            nonce: auth.nonce,
            signature: signature.as_bytes().to_vec(),
        }
    }

    /// Sign an opening request as the receiver.
    pub fn sign_open(
        program: &ProgramId,
        receiver: &Keypair,
        index: DocumentIndex,
        nonce: u64,
    ) -> Self {
        let auth = OpenAuthorization::new(receiver.identity(), index, nonce);
        let signature = auth.sign(program, receiver);
        Self::Open {
            receiver: auth.receiver,
            index,
            nonce,
            signature: signature.as_bytes().to_vec(),
        }
    }

    /// The identity whose signature authorizes this request.
    pub fn signer(&self) -> &Identity {
        match self {
            Self::Create { sender, .. } => sender,
            Self::Open { receiver, .. } => receiver,
        }
    }

    /// Raw signature bytes as submitted.
    pub fn signature(&self) -> &[u8] {
        match self {
            Self::Create { signature, .. } | Self::Open { signature, .. } => signature,
        }
    }

    /// Authorization digest for this request under `program`.
    pub fn digest(&self, program: &ProgramId) -> Digest {
        match self {
            Self::Create {
                sender,
                receiver,
                data,
                nonce,
                ..
            } => CreateAuthorization::new(*sender, *receiver, data.clone(), *nonce).digest(program),
            Self::Open {
                receiver,
                index,
                nonce,
                ..
            } => OpenAuthorization::new(*receiver, *index, *nonce).digest(program),
        }
    }

    /// Encode as CBOR.
    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| RegistryError::InvalidRequest(e.to_string()))?;
        Ok(buf)
    }

    /// Decode from CBOR.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|e| RegistryError::InvalidRequest(e.to_string()))
    }
}

/// What a submitted request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmitOutcome {
    /// A document was created at this index.
    Created { index: DocumentIndex },
    /// The document was opened at this time.
    Opened { opened_at: Timestamp },
}
