//! Golden test vectors for deterministic verification.
//!
//! Encodings, digests and signatures here are fixed. Any change to the codec
//! layout, the digest domains or the signing path breaks them, which is the
//! point: stored records and signed authorizations depend on all three.

use notary_core::{
    CreateAuthorization, Document, Encode, Keypair, OpenAuthorization, ProgramId,
    ReceiverDescriptor,
};
use serde::Serialize;

/// Program id used by every vector.
pub const VECTOR_PROGRAM: [u8; 32] = [0x11; 32];

/// The presigned operation a vector describes.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum VectorOp {
    Create {
        receiver_seed: [u8; 32],
        data: &'static [u8],
        nonce: u64,
    },
    Open {
        index: u32,
        nonce: u64,
    },
}

/// A golden authorization vector.
#[derive(Debug, Clone, Serialize)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Seed of the signing party (sender for create, receiver for open).
    pub signer_seed: [u8; 32],
    pub op: VectorOp,
    /// Expected codec encoding of the authorization payload (hex).
    pub expected_encoding: &'static str,
    /// Expected authorization digest (hex).
    pub expected_digest: &'static str,
    /// Expected deterministic Ed25519 signature over the digest (hex).
    pub expected_signature: &'static str,
}

/// Results of running one vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorOutput {
    pub encoding: String,
    pub digest: String,
    pub signature: String,
}

/// Get all golden authorization vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "create with link payload",
            signer_seed: [0x01; 32],
            op: VectorOp::Create {
                receiver_seed: [0x02; 32],
                data: b"ipfs://doc#sha256",
                nonce: 1,
            },
            expected_encoding: "8a88e3dd7409f195fd52db2d3cba5d72ca6709bf1d94121bf3748801b40f6f5c\
                                8139770ea87d175f56a35466c34c7ecccb8d8a91b4ee37a25df60f5b8fc9b394\
                                11000000697066733a2f2f646f63237368613235360100000000000000",
            expected_digest: "5f76508114a512ba7d9ad05228e42a0043f0083f123f2b0b108710ed88ab9700",
            expected_signature: "005874c188f940aaebd0dd44e8ef4021bead4e6edf932d1ebd84975c8f434bfe\
                                 2aba7736fb5607d71ef3ae7d0e11db4fa1642a593db63efae0178069b2989000",
        },
        GoldenVector {
            name: "open first document",
            signer_seed: [0x02; 32],
            op: VectorOp::Open { index: 0, nonce: 2 },
            expected_encoding: "8139770ea87d175f56a35466c34c7ecccb8d8a91b4ee37a25df60f5b8fc9b394\
                                000000000200000000000000",
            expected_digest: "d11d72fcc8eeb392ce1d8d218ffddbb8309b5d2a13e256f340d7f633cd6ed28e",
            expected_signature: "3a85c411ade29d1f866d54794fffb10daf59bc2bcdcdc46de8585c4349dea875\
                                 c5bc5904400f21e69e8cf9de80a2c180ed526be490bd6045f1fc2f54cd7dd605",
        },
    ]
}

/// Compute the encoding, digest and signature a vector describes.
pub fn run_vector(vector: &GoldenVector) -> VectorOutput {
    let program = ProgramId::from_bytes(VECTOR_PROGRAM);
    let signer = Keypair::from_seed(&vector.signer_seed);

    let (encoding, digest) = match &vector.op {
        VectorOp::Create {
            receiver_seed,
            data,
            nonce,
        } => {
            let receiver = Keypair::from_seed(receiver_seed).identity();
            let auth = CreateAuthorization::new(signer.identity(), receiver, data.to_vec(), *nonce);
            (auth.encode_to_vec(), auth.digest(&program))
        }
        VectorOp::Open { index, nonce } => {
            let auth = OpenAuthorization::new(signer.identity(), *index, *nonce);
            (auth.encode_to_vec(), auth.digest(&program))
        }
    };

    VectorOutput {
        encoding: hex::encode(encoding),
        digest: digest.to_hex(),
        signature: signer.sign(&digest).to_hex(),
    }
}

/// Verify all golden vectors.
///
/// Returns `(name, matches, computed digest)` for each vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .map(|v| {
            let out = run_vector(v);
            let matches = out.encoding == v.expected_encoding
                && out.digest == v.expected_digest
                && out.signature == v.expected_signature;
            (v.name.to_string(), matches, out.digest)
        })
        .collect()
}

/// Export the vectors as JSON for other implementations.
pub fn vectors_json() -> serde_json::Result<String> {
    serde_json::to_string_pretty(&all_vectors())
}

/// A fixed record encoding.
#[derive(Debug, Clone)]
pub struct RecordVector {
    pub name: &'static str,
    pub encoded: Vec<u8>,
    pub expected_hex: &'static str,
}

/// Fixed encodings of the persisted records.
pub fn record_vectors() -> Vec<RecordVector> {
    let sender = Keypair::from_seed(&[0x01; 32]).identity();
    vec![
        RecordVector {
            name: "descriptor with three documents",
            encoded: ReceiverDescriptor {
                documents_counter: 3,
            }
            .encode_to_vec(),
            expected_hex: "03000000",
        },
        RecordVector {
            name: "unopened document",
            encoded: Document::new(sender, b"ipfs://doc#sha256".to_vec(), 1_700_000_000)
                .encode_to_vec(),
            expected_hex: "8a88e3dd7409f195fd52db2d3cba5d72ca6709bf1d94121bf3748801b40f6f5c\
                           11000000697066733a2f2f646f6323736861323536\
                           00f1536500000000\
                           0000000000000000",
        },
    ]
}
