//! Proptest generators for property-based testing.

use proptest::prelude::*;

use notary_core::{
    CreateAuthorization, Document, Identity, Keypair, OpenAuthorization, ReceiverDescriptor,
    Timestamp,
};

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// Generate arbitrary identity bytes, not necessarily a curve point.
pub fn identity() -> impl Strategy<Value = Identity> {
    any::<[u8; 32]>().prop_map(Identity::from_bytes)
}

/// Generate payload bytes of specified max length.
pub fn payload(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate a timestamp, including the "not opened" zero.
pub fn timestamp() -> impl Strategy<Value = Timestamp> {
    prop_oneof![Just(0u64), 1u64..=4_102_444_800u64, Just(u64::MAX)]
}

/// Generate a document record.
pub fn document() -> impl Strategy<Value = Document> {
    (identity(), payload(512), timestamp(), timestamp()).prop_map(
        |(sender, data, sent_at, opened_at)| Document {
            sender,
            data,
            sent_at,
            opened_at,
        },
    )
}

/// Generate a receiver descriptor.
pub fn descriptor() -> impl Strategy<Value = ReceiverDescriptor> {
    any::<u32>().prop_map(|documents_counter| ReceiverDescriptor { documents_counter })
}

/// Parameters for a presigned creation.
#[derive(Debug, Clone)]
pub struct CreateParams {
    pub sender: Keypair,
    pub receiver: Identity,
    pub data: Vec<u8>,
    pub nonce: u64,
}

impl CreateParams {
    pub fn authorization(&self) -> CreateAuthorization {
        CreateAuthorization::new(
            self.sender.identity(),
            self.receiver,
            self.data.clone(),
            self.nonce,
        )
    }
}

impl Arbitrary for CreateParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (keypair(), identity(), payload(256), any::<u64>())
            .prop_map(|(sender, receiver, data, nonce)| CreateParams {
                sender,
                receiver,
                data,
                nonce,
            })
            .boxed()
    }
}

/// Parameters for a presigned opening.
#[derive(Debug, Clone)]
pub struct OpenParams {
    pub receiver: Keypair,
    pub index: u32,
    pub nonce: u64,
}

impl OpenParams {
    pub fn authorization(&self) -> OpenAuthorization {
        OpenAuthorization::new(self.receiver.identity(), self.index, self.nonce)
    }
}

impl Arbitrary for OpenParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (keypair(), any::<u32>(), any::<u64>())
            .prop_map(|(receiver, index, nonce)| OpenParams {
                receiver,
                index,
                nonce,
            })
            .boxed()
    }
}
