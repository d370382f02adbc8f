//! Registry state survives reopening the database file.

use notary::core::Document;
use notary::store::{SqliteStorage, Storage};
use notary::StrategyKind;
use notary_testkit::fixtures::{sender_and_receiver, TestFixture, START_TIME};
use tempfile::TempDir;

async fn write_then_reopen(strategy: StrategyKind) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notary.db");
    let (a, b) = sender_and_receiver();

    let digest = {
        let fixture = TestFixture::with_storage(SqliteStorage::open(&path).unwrap(), strategy);
        fixture
            .registry
            .set_document(a.identity(), b.identity(), b"first".to_vec())
            .await
            .unwrap();

        let digest = fixture
            .registry
            .create_digest(a.identity(), b.identity(), b"second", 1);
        let signature = a.sign(&digest).as_bytes().to_vec();
        fixture
            .registry
            .set_presigned_document(a.identity(), b.identity(), b"second".to_vec(), 1, &signature)
            .await
            .unwrap();

        fixture.clock.advance(60);
        fixture
            .registry
            .set_opened_at(b.identity(), b.identity(), 0)
            .await
            .unwrap();
        digest
    };

    let fixture = TestFixture::with_storage(SqliteStorage::open(&path).unwrap(), strategy);
    let docs = fixture.registry.get_documents(&b.identity()).await.unwrap();
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].data, b"first");
    assert_eq!(docs[0].opened_at, START_TIME + 60);
    assert_eq!(docs[1].data, b"second");
    assert!(!docs[1].is_opened());

    // Replay markers persist too.
    assert!(fixture.registry.is_executed(&digest).await.unwrap());
    let signature = a.sign(&digest).as_bytes().to_vec();
    let err = fixture
        .registry
        .set_presigned_document(a.identity(), b.identity(), b"second".to_vec(), 1, &signature)
        .await
        .unwrap_err();
    assert_eq!(err.code(), 6);

    // Counting continues where it left off.
    let index = fixture
        .registry
        .set_document(a.identity(), b.identity(), b"third".to_vec())
        .await
        .unwrap();
    assert_eq!(index, 2);
}

#[tokio::test]
async fn test_mapping_state_survives_reopen() {
    write_then_reopen(StrategyKind::Mapping).await;
}

#[tokio::test]
async fn test_segmented_state_survives_reopen() {
    write_then_reopen(StrategyKind::Segmented).await;
}

#[tokio::test]
async fn test_segmented_cells_are_sized_to_records() {
    let fixture = TestFixture::sqlite(StrategyKind::Segmented);
    let (a, b) = sender_and_receiver();

    for len in [0usize, 1, 200] {
        let index = fixture
            .registry
            .set_document(a.identity(), b.identity(), vec![0xab; len])
            .await
            .unwrap();
        let key = fixture.registry.document_key(&b.identity(), index).unwrap();
        assert!(key.is_cell());
        let capacity = fixture.registry.storage().capacity(&key).await.unwrap();
        assert_eq!(capacity, Some(Document::size_for(len)));
    }

    let key = fixture.registry.receiver_key(&b.identity()).unwrap();
    assert_eq!(
        fixture.registry.storage().capacity(&key).await.unwrap(),
        Some(4)
    );
}

#[tokio::test]
async fn test_mapping_entries_have_no_capacity() {
    let fixture = TestFixture::sqlite(StrategyKind::Mapping);
    let (a, b) = sender_and_receiver();
    fixture
        .registry
        .set_document(a.identity(), b.identity(), b"plain".to_vec())
        .await
        .unwrap();

    let key = fixture.registry.document_key(&b.identity(), 0).unwrap();
    assert!(!key.is_cell());
    assert_eq!(fixture.registry.storage().capacity(&key).await.unwrap(), None);
    assert_eq!(fixture.registry.storage().len().await.unwrap(), 2);
}
