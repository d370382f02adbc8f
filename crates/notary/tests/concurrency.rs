//! Concurrent callers against one shared registry.

use std::collections::BTreeSet;
use std::sync::Arc;

use notary::{PresignedRequest, RegistryError, StrategyKind};
use notary_testkit::fixtures::{parties, TestFixture};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_get_unique_indices() {
    init_tracing();

    for strategy in [StrategyKind::Mapping, StrategyKind::Segmented] {
        let fixture = TestFixture::sqlite(strategy);
        let registry = Arc::new(fixture.registry);
        let people = parties(9);
        let receiver = people[8].identity();

        let mut handles = Vec::new();
        for i in 0..32usize {
            let registry = registry.clone();
            let sender = people[i % 8].identity();
            handles.push(tokio::spawn(async move {
                registry
                    .set_document(sender, receiver, format!("doc-{i}").into_bytes())
                    .await
            }));
        }

        let mut indices = BTreeSet::new();
        for handle in handles {
            indices.insert(handle.await.unwrap().unwrap());
        }

        assert_eq!(indices, (0..32).collect::<BTreeSet<_>>());
        assert_eq!(registry.get_documents_count(&receiver).await.unwrap(), 32);
        assert_eq!(registry.get_documents(&receiver).await.unwrap().len(), 32);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_replay_executes_once() {
    init_tracing();

    let fixture = TestFixture::memory(StrategyKind::Segmented);
    let people = parties(2);
    let request = PresignedRequest::sign_create(
        fixture.program_id(),
        &people[0],
        people[1].identity(),
        b"once".to_vec(),
        42,
    );
    let registry = Arc::new(fixture.registry);

    let mut handles = Vec::new();
    for _ in 0..16 {
        let registry = registry.clone();
        let request = request.clone();
        handles.push(tokio::spawn(async move { registry.submit(request).await }));
    }

    let mut executed = 0;
    let mut replayed = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => executed += 1,
            Err(RegistryError::AlreadyExecuted(_)) => replayed += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(executed, 1);
    assert_eq!(replayed, 15);
    assert_eq!(
        registry
            .get_documents_count(&people[1].identity())
            .await
            .unwrap(),
        1
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_opens_race_to_one_winner() {
    init_tracing();

    let fixture = TestFixture::memory(StrategyKind::Mapping);
    let people = parties(2);
    let receiver = people[1].identity();
    fixture
        .registry
        .set_document(people[0].identity(), receiver, b"race".to_vec())
        .await
        .unwrap();
    let registry = Arc::new(fixture.registry);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let registry = registry.clone();
        handles.push(tokio::spawn(async move {
            registry.set_opened_at(receiver, receiver, 0).await
        }));
    }

    let mut winners = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => winners += 1,
            Err(e) => assert!(matches!(e, RegistryError::AlreadyOpened { .. })),
        }
    }
    assert_eq!(winners, 1);
}
