//! End-to-end registry scenarios.
//!
//! Every scenario runs against both storage strategies on both backends.

use notary::core::{Decode, Document, Encode, Identity, ReceiverDescriptor};
use notary::store::{Storage, StorageKey, WriteBatch};
use notary::{PresignedRequest, RegistryError, RegistryEvent, StrategyKind, SubmitOutcome};
use notary_testkit::fixtures::{
    parties, sender_and_receiver, unsignable_identity, TestFixture, START_TIME,
};

macro_rules! scenario_suite {
    ($($name:ident),* $(,)?) => {
        mod mapping_memory {
            $(
                #[tokio::test]
                async fn $name() {
                    let fixture = super::TestFixture::memory(super::StrategyKind::Mapping);
                    super::$name(fixture).await;
                }
            )*
        }

        mod segmented_memory {
            $(
                #[tokio::test]
                async fn $name() {
                    let fixture = super::TestFixture::memory(super::StrategyKind::Segmented);
                    super::$name(fixture).await;
                }
            )*
        }

        mod mapping_sqlite {
            $(
                #[tokio::test]
                async fn $name() {
                    let fixture = super::TestFixture::sqlite(super::StrategyKind::Mapping);
                    super::$name(fixture).await;
                }
            )*
        }

        mod segmented_sqlite {
            $(
                #[tokio::test]
                async fn $name() {
                    let fixture = super::TestFixture::sqlite(super::StrategyKind::Segmented);
                    super::$name(fixture).await;
                }
            )*
        }
    };
}

scenario_suite!(
    create_and_read,
    open_twice,
    open_by_stranger,
    presigned_create_replay,
    presigned_open,
    presigned_rejects_forgeries,
    missing_documents,
    mixed_direct_and_presigned_indices,
    list_documents,
    failed_operations_change_nothing,
    timestamps_never_go_backwards,
    submit_wire_requests,
    events_in_commit_order,
    counter_matches_descriptor_record,
    corrupt_records_are_reported,
);

async fn create_and_read<S: Storage>(fx: TestFixture<S>) {
    let (a, b) = sender_and_receiver();

    let index = fx
        .registry
        .set_document(a.identity(), b.identity(), b"link1".to_vec())
        .await
        .unwrap();
    assert_eq!(index, 0);

    let doc = fx.registry.get_document(&b.identity(), 0).await.unwrap();
    assert_eq!(
        doc,
        Document {
            sender: a.identity(),
            data: b"link1".to_vec(),
            sent_at: START_TIME,
            opened_at: 0,
        }
    );
    assert_eq!(fx.registry.get_documents_count(&b.identity()).await.unwrap(), 1);
    assert_eq!(fx.registry.get_documents_count(&a.identity()).await.unwrap(), 0);
}

async fn open_twice<S: Storage>(fx: TestFixture<S>) {
    let (a, b) = sender_and_receiver();
    fx.registry
        .set_document(a.identity(), b.identity(), b"contract".to_vec())
        .await
        .unwrap();

    let t1 = fx.clock.advance(30);
    let opened_at = fx
        .registry
        .set_opened_at(b.identity(), b.identity(), 0)
        .await
        .unwrap();
    assert_eq!(opened_at, t1);

    fx.clock.advance(30);
    let err = fx
        .registry
        .set_opened_at(b.identity(), b.identity(), 0)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::AlreadyOpened { opened_at, .. } if opened_at == t1));

    let doc = fx.registry.get_document(&b.identity(), 0).await.unwrap();
    assert_eq!(doc.opened_at, t1);
}

async fn open_by_stranger<S: Storage>(fx: TestFixture<S>) {
    let (a, b) = sender_and_receiver();
    fx.registry
        .set_document(a.identity(), b.identity(), b"x".to_vec())
        .await
        .unwrap();

    // The sender is not the receiver either.
    let err = fx
        .registry
        .set_opened_at(a.identity(), b.identity(), 0)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::Unauthorized { .. }));
    assert_eq!(err.code(), 2);

    let doc = fx.registry.get_document(&b.identity(), 0).await.unwrap();
    assert!(!doc.is_opened());
}

async fn presigned_create_replay<S: Storage>(fx: TestFixture<S>) {
    let (a, b) = sender_and_receiver();
    let data = b"signed link".to_vec();
    let signature = a
        .sign(&fx.registry.create_digest(a.identity(), b.identity(), &data, 7))
        .as_bytes()
        .to_vec();

    let index = fx
        .registry
        .set_presigned_document(a.identity(), b.identity(), data.clone(), 7, &signature)
        .await
        .unwrap();
    assert_eq!(index, 0);

    let doc = fx.registry.get_document(&b.identity(), 0).await.unwrap();
    assert_eq!(doc.sender, a.identity());

    let err = fx
        .registry
        .set_presigned_document(a.identity(), b.identity(), data.clone(), 7, &signature)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::AlreadyExecuted(_)));
    assert_eq!(fx.registry.get_documents_count(&b.identity()).await.unwrap(), 1);

    let digest = fx.registry.create_digest(a.identity(), b.identity(), &data, 7);
    assert!(fx.registry.is_executed(&digest).await.unwrap());
    let other = fx.registry.create_digest(a.identity(), b.identity(), &data, 8);
    assert!(!fx.registry.is_executed(&other).await.unwrap());
}

async fn presigned_open<S: Storage>(fx: TestFixture<S>) {
    let (a, b) = sender_and_receiver();
    fx.registry
        .set_document(a.identity(), b.identity(), b"doc".to_vec())
        .await
        .unwrap();

    let sign = |nonce| {
        b.sign(&fx.registry.open_digest(b.identity(), 0, nonce))
            .as_bytes()
            .to_vec()
    };

    let opened_at = fx
        .registry
        .set_presigned_opened_at(b.identity(), 0, 1, &sign(1))
        .await
        .unwrap();
    assert_eq!(opened_at, START_TIME);

    let err = fx
        .registry
        .set_presigned_opened_at(b.identity(), 0, 1, &sign(1))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::AlreadyExecuted(_)));

    // A fresh nonce passes the replay check and then hits the document state.
    let err = fx
        .registry
        .set_presigned_opened_at(b.identity(), 0, 2, &sign(2))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::AlreadyOpened { .. }));
    let unused = fx.registry.open_digest(b.identity(), 0, 2);
    assert!(!fx.registry.is_executed(&unused).await.unwrap());
}

async fn presigned_rejects_forgeries<S: Storage>(fx: TestFixture<S>) {
    let (a, b) = sender_and_receiver();
    let data = b"payload".to_vec();
    let digest = fx.registry.create_digest(a.identity(), b.identity(), &data, 1);
    let signature = a.sign(&digest).as_bytes().to_vec();

    // Signed by the wrong key.
    let by_b = b.sign(&digest).as_bytes().to_vec();
    let err = fx
        .registry
        .set_presigned_document(a.identity(), b.identity(), data.clone(), 1, &by_b)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::InvalidSignature { .. }));

    // Each field altered by the relayer.
    let attempts = [
        (a.identity(), b.identity(), b"payloaD".to_vec(), 1),
        (a.identity(), b.identity(), data.clone(), 2),
        (a.identity(), a.identity(), data.clone(), 1),
        (b.identity(), b.identity(), data.clone(), 1),
    ];
    for (sender, receiver, data, nonce) in attempts {
        let err = fx
            .registry
            .set_presigned_document(sender, receiver, data, nonce, &signature)
            .await
            .unwrap_err();
        assert_eq!(err.code(), 4, "altered request accepted: {err}");
    }

    // Bad length is an encoding error, not a verification failure.
    let err = fx
        .registry
        .set_presigned_document(a.identity(), b.identity(), data.clone(), 1, &signature[..63])
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::InvalidSignatureEncoding(63)));

    // An identity nobody can hold a key for never verifies.
    let ghost = unsignable_identity();
    let err = fx
        .registry
        .set_presigned_document(ghost, b.identity(), data.clone(), 1, &signature)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::InvalidSignature { .. }));

    // Wrong-key opening.
    fx.registry
        .set_document(a.identity(), b.identity(), data)
        .await
        .unwrap();
    let open_sig = a
        .sign(&fx.registry.open_digest(b.identity(), 0, 9))
        .as_bytes()
        .to_vec();
    let err = fx
        .registry
        .set_presigned_opened_at(b.identity(), 0, 9, &open_sig)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::InvalidSignature { .. }));

    assert!(fx
        .registry
        .is_valid_signature(&a.identity(), &digest, &signature)
        .unwrap());
    assert!(!fx
        .registry
        .is_valid_signature(&b.identity(), &digest, &signature)
        .unwrap());
}

async fn missing_documents<S: Storage>(fx: TestFixture<S>) {
    let (a, b) = sender_and_receiver();

    let err = fx.registry.get_document(&b.identity(), 5).await.unwrap_err();
    assert!(matches!(err, RegistryError::DocumentNotFound { index: 5, .. }));

    fx.registry
        .set_document(a.identity(), b.identity(), vec![])
        .await
        .unwrap();

    let err = fx.registry.get_document(&b.identity(), 1).await.unwrap_err();
    assert!(matches!(err, RegistryError::DocumentNotFound { index: 1, .. }));

    let err = fx
        .registry
        .set_opened_at(b.identity(), b.identity(), 5)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::DocumentNotFound { .. }));
    assert_eq!(err.code(), 1);

    // Presigned opening of a missing document: signature and replay pass first.
    let sig = b
        .sign(&fx.registry.open_digest(b.identity(), 5, 0))
        .as_bytes()
        .to_vec();
    let err = fx
        .registry
        .set_presigned_opened_at(b.identity(), 5, 0, &sig)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::DocumentNotFound { .. }));
}

async fn mixed_direct_and_presigned_indices<S: Storage>(fx: TestFixture<S>) {
    let (a, b) = sender_and_receiver();

    let first = fx
        .registry
        .set_document(a.identity(), b.identity(), b"0".to_vec())
        .await
        .unwrap();

    let request =
        PresignedRequest::sign_create(fx.program_id(), &a, b.identity(), b"1".to_vec(), 0);
    let second = fx.registry.submit(request).await.unwrap();

    let third = fx
        .registry
        .set_document(b.identity(), b.identity(), b"2".to_vec())
        .await
        .unwrap();

    assert_eq!(first, 0);
    assert_eq!(second, SubmitOutcome::Created { index: 1 });
    assert_eq!(third, 2);
    assert_eq!(fx.registry.get_documents_count(&b.identity()).await.unwrap(), 3);
}

async fn list_documents<S: Storage>(fx: TestFixture<S>) {
    let people = parties(4);
    let receiver = people[0].identity();

    assert!(fx.registry.get_documents(&receiver).await.unwrap().is_empty());

    for (i, sender) in people.iter().enumerate() {
        fx.clock.advance(1);
        fx.registry
            .set_document(sender.identity(), receiver, vec![i as u8; i * 10])
            .await
            .unwrap();
    }

    let docs = fx.registry.get_documents(&receiver).await.unwrap();
    assert_eq!(docs.len(), 4);
    for (i, doc) in docs.iter().enumerate() {
        assert_eq!(doc.sender, people[i].identity());
        assert_eq!(doc.data.len(), i * 10);
        assert_eq!(doc.sent_at, START_TIME + i as u64 + 1);
    }
}

async fn failed_operations_change_nothing<S: Storage>(fx: TestFixture<S>) {
    let (a, b) = sender_and_receiver();
    fx.registry
        .set_document(a.identity(), b.identity(), b"doc".to_vec())
        .await
        .unwrap();
    fx.registry
        .set_opened_at(b.identity(), b.identity(), 0)
        .await
        .unwrap();

    let before = fx.registry.storage().entries().await.unwrap();

    let _ = fx.registry.set_opened_at(b.identity(), b.identity(), 0).await;
    let _ = fx.registry.set_opened_at(a.identity(), b.identity(), 0).await;
    let _ = fx.registry.set_opened_at(b.identity(), b.identity(), 3).await;

    let open_sig = b
        .sign(&fx.registry.open_digest(b.identity(), 0, 44))
        .as_bytes()
        .to_vec();
    let err = fx
        .registry
        .set_presigned_opened_at(b.identity(), 0, 44, &open_sig)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::AlreadyOpened { .. }));

    let _ = fx
        .registry
        .set_presigned_document(a.identity(), b.identity(), vec![1], 1, &[0u8; 64])
        .await;

    let after = fx.registry.storage().entries().await.unwrap();
    assert_eq!(before, after);
}

async fn timestamps_never_go_backwards<S: Storage>(fx: TestFixture<S>) {
    let (a, b) = sender_and_receiver();
    fx.registry
        .set_document(a.identity(), b.identity(), b"doc".to_vec())
        .await
        .unwrap();

    fx.clock.set(START_TIME - 1_000);
    let opened_at = fx
        .registry
        .set_opened_at(b.identity(), b.identity(), 0)
        .await
        .unwrap();
    assert_eq!(opened_at, START_TIME);

    fx.clock.set(0);
    fx.registry
        .set_document(a.identity(), b.identity(), b"later".to_vec())
        .await
        .unwrap();
    let doc = fx.registry.get_document(&b.identity(), 1).await.unwrap();
    assert!(doc.sent_at >= START_TIME);
}

async fn submit_wire_requests<S: Storage>(fx: TestFixture<S>) {
    let (a, b) = sender_and_receiver();

    let create = PresignedRequest::sign_create(fx.program_id(), &a, b.identity(), b"w".to_vec(), 3);
    let outcome = fx
        .registry
        .submit_cbor(&create.to_cbor().unwrap())
        .await
        .unwrap();
    assert_eq!(outcome, SubmitOutcome::Created { index: 0 });

    fx.clock.advance(10);
    let open = PresignedRequest::sign_open(fx.program_id(), &b, 0, 3);
    let outcome = fx.registry.submit_cbor(&open.to_cbor().unwrap()).await.unwrap();
    assert_eq!(
        outcome,
        SubmitOutcome::Opened {
            opened_at: START_TIME + 10
        }
    );

    let err = fx.registry.submit_cbor(b"not cbor at all").await.unwrap_err();
    assert_eq!(err.code(), 9);

    // A request signed for another deployment is not valid here.
    let foreign = notary::core::ProgramId::from_name("elsewhere");
    let request = PresignedRequest::sign_create(&foreign, &a, b.identity(), b"w".to_vec(), 3);
    let err = fx.registry.submit(request).await.unwrap_err();
    assert!(matches!(err, RegistryError::InvalidSignature { .. }));
}

async fn events_in_commit_order<S: Storage>(fx: TestFixture<S>) {
    let (a, b) = sender_and_receiver();
    let mut events = fx.registry.subscribe();

    fx.registry
        .set_document(a.identity(), b.identity(), b"e".to_vec())
        .await
        .unwrap();
    let _ = fx.registry.set_opened_at(a.identity(), b.identity(), 0).await;
    fx.clock.advance(5);
    fx.registry
        .set_opened_at(b.identity(), b.identity(), 0)
        .await
        .unwrap();

    assert_eq!(
        events.recv().await.unwrap(),
        RegistryEvent::DocumentSet {
            sender: a.identity(),
            receiver: b.identity(),
            index: 0,
            data: b"e".to_vec(),
            sent_at: START_TIME,
        }
    );
    assert_eq!(
        events.recv().await.unwrap(),
        RegistryEvent::OpenedAtSet {
            receiver: b.identity(),
            index: 0,
            opened_at: START_TIME + 5,
        }
    );
    assert!(events.try_recv().is_err());
}

async fn counter_matches_descriptor_record<S: Storage>(fx: TestFixture<S>) {
    let (a, b) = sender_and_receiver();
    for _ in 0..3 {
        fx.registry
            .set_document(a.identity(), b.identity(), b"c".to_vec())
            .await
            .unwrap();
    }

    let key = fx.registry.receiver_key(&b.identity()).unwrap();
    let raw = fx.registry.storage().read(&key).await.unwrap().unwrap();
    let descriptor = ReceiverDescriptor::decode_exact(&raw).unwrap();
    assert_eq!(descriptor.documents_counter, 3);

    let key = fx.registry.document_key(&b.identity(), 2).unwrap();
    let raw = fx.registry.storage().read(&key).await.unwrap().unwrap();
    assert_eq!(raw.len(), Document::size_for(1));

    let unknown = Identity::from_bytes([0x77; 32]);
    let key = fx.registry.receiver_key(&unknown).unwrap();
    assert!(fx.registry.storage().read(&key).await.unwrap().is_none());
}

/// Store raw bytes under `key`, sizing the cell to fit when one is needed.
async fn plant<S: Storage>(fx: &TestFixture<S>, key: StorageKey, bytes: Vec<u8>) {
    let mut batch = WriteBatch::new();
    if key.is_cell() {
        batch.allocate(key, bytes.len());
    }
    batch.write(key, bytes);
    fx.registry.storage().apply(batch).await.unwrap();
}

async fn corrupt_records_are_reported<S: Storage>(fx: TestFixture<S>) {
    let people = parties(4);
    let sender = people[0].identity();

    // Counter already at its limit.
    let full = people[1].identity();
    let descriptor = ReceiverDescriptor {
        documents_counter: u32::MAX,
    };
    plant(&fx, fx.registry.receiver_key(&full).unwrap(), descriptor.encode_to_vec()).await;
    let before = fx.registry.storage().entries().await.unwrap();

    let err = fx
        .registry
        .set_document(sender, full, b"one too many".to_vec())
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::AllocationFailure(_)));
    assert_eq!(err.code(), 8);
    assert_eq!(fx.registry.get_documents_count(&full).await.unwrap(), u32::MAX);
    assert_eq!(fx.registry.storage().entries().await.unwrap(), before);

    // Counted, but the record was never stored.
    let hollow = people[2].identity();
    let descriptor = ReceiverDescriptor {
        documents_counter: 8,
    };
    plant(&fx, fx.registry.receiver_key(&hollow).unwrap(), descriptor.encode_to_vec()).await;

    let err = fx
        .registry
        .set_opened_at(hollow, hollow, 7)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::MalformedRecord(_)));
    assert_eq!(err.code(), 7);
    let err = fx.registry.get_document(&hollow, 7).await.unwrap_err();
    assert!(matches!(err, RegistryError::DocumentNotFound { index: 7, .. }));

    // A truncated document record.
    let damaged = people[3].identity();
    let descriptor = ReceiverDescriptor {
        documents_counter: 1,
    };
    plant(&fx, fx.registry.receiver_key(&damaged).unwrap(), descriptor.encode_to_vec()).await;
    plant(&fx, fx.registry.document_key(&damaged, 0).unwrap(), vec![1, 2, 3]).await;

    let err = fx.registry.get_document(&damaged, 0).await.unwrap_err();
    assert!(matches!(err, RegistryError::MalformedRecord(_)));
    let err = fx
        .registry
        .set_opened_at(damaged, damaged, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::MalformedRecord(_)));
}
