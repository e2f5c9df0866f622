//! End-to-end pipeline behavior against in-memory backends.

mod common;

use std::time::Duration;

use common::*;
use order_dispatch::backend::{BusVariant, StoreVariant};
use order_dispatch::database::{partition_index, InMemoryDocumentStore, ShardBootstrap};
use order_dispatch::messaging::providers::{
    ConnectScript, InMemoryLegacyConnector, InMemoryManagedConnector,
};
use order_dispatch::messaging::MessageDispatcher;
use order_dispatch::models::{Order, OrderEnvelope};
use order_dispatch::pipeline::OrderPipeline;

#[tokio::test]
async fn test_self_hosted_capture_stores_and_publishes() {
    let harness = TestHarness::new();
    let pipeline = OrderPipeline::bootstrap(
        test_config(SELF_HOSTED_STORE, SELF_HOSTED_BUS),
        harness.collaborators(),
    )
    .await
    .unwrap();

    assert!(pipeline.is_ready());
    assert_eq!(pipeline.selection().store, StoreVariant::SelfHosted);
    assert_eq!(pipeline.selection().bus, BusVariant::SelfHosted);

    let stored = pipeline
        .capture(&Order::new("buyer@example.com").with_product("socks").with_total(9.5))
        .await
        .unwrap();

    assert_eq!(stored.status, "Open");
    assert_eq!(stored.total, Some(9.5));
    assert_eq!(harness.store.documents("k8orders", "orders"), vec![stored.clone()]);

    let envelopes = harness.legacy.published_envelopes();
    assert_eq!(
        envelopes,
        vec![OrderEnvelope {
            order: stored.id.clone(),
            source: TEAM.to_string(),
        }]
    );
}

#[tokio::test]
async fn test_event_sequence_for_one_order() {
    let harness = TestHarness::new();
    let pipeline = OrderPipeline::bootstrap(
        test_config(SELF_HOSTED_STORE, SELF_HOSTED_BUS),
        harness.collaborators(),
    )
    .await
    .unwrap();

    let stored = pipeline.capture(&Order::new("buyer@example.com")).await.unwrap();

    for sink in [&harness.challenge, &harness.custom] {
        let names: Vec<String> = sink.events().into_iter().map(|e| e.name).collect();
        assert_eq!(
            names,
            vec!["Initial order", "CaptureOrder to MongoDB", "SendOrder to RabbitMQ"]
        );

        let sequences: Vec<String> = sink
            .events()
            .iter()
            .filter_map(|e| e.property("sequence").map(str::to_string))
            .collect();
        assert_eq!(sequences, vec!["0", "1", "2"]);

        let published = &sink.events_named("SendOrder to RabbitMQ")[0];
        assert_eq!(published.property("orderId"), Some(stored.id.as_str()));
        assert_eq!(published.property("team"), Some(TEAM));
        assert_eq!(published.property("service"), Some("CaptureOrder"));
    }

    let operations: Vec<String> = harness
        .challenge
        .dependencies()
        .into_iter()
        .map(|d| format!("{}:{}", d.name, d.data))
        .collect();
    assert_eq!(
        operations,
        vec![
            "MongoDB:Create session",
            "MongoDB:Insert order",
            "RabbitMQ:Send message"
        ]
    );
}

#[tokio::test]
async fn test_managed_backends_are_selected_from_urls() {
    let harness = TestHarness::new();
    let pipeline =
        OrderPipeline::bootstrap(test_config(MANAGED_STORE, MANAGED_BUS), harness.collaborators())
            .await
            .unwrap();

    assert_eq!(pipeline.selection().store, StoreVariant::Managed);
    assert!(matches!(pipeline.dispatcher(), MessageDispatcher::Managed(_)));

    let stored = pipeline.capture(&Order::new("buyer@example.com")).await.unwrap();

    assert_eq!(harness.challenge.events_named("CaptureOrder to CosmosDB").len(), 1);
    let sent = &harness.challenge.events_named("SendOrder to ServiceBus")[0];
    assert_eq!(sent.property("type"), Some("servicebus"));
    assert_eq!(harness.managed.sent_envelopes()[0].order, stored.id);
    assert_eq!(harness.legacy.dial_count(), 0);
}

#[tokio::test]
async fn test_already_sharded_collection_still_reaches_readiness() {
    let harness = TestHarness::with_parts(
        InMemoryDocumentStore::new().with_collection_already_sharded("k8orders", "orders"),
        InMemoryLegacyConnector::new(),
        InMemoryManagedConnector::new(),
    );

    let pipeline = OrderPipeline::bootstrap(
        test_config(SELF_HOSTED_STORE, SELF_HOSTED_BUS),
        harness.collaborators(),
    )
    .await
    .unwrap();

    assert!(matches!(pipeline.shard_bootstrap(), ShardBootstrap::Skipped(_)));
    assert!(pipeline.is_ready());
    assert_eq!(harness.challenge.exceptions().len(), 1);
}

#[tokio::test]
async fn test_first_run_shards_the_collection() {
    let harness = TestHarness::new();
    let pipeline = OrderPipeline::bootstrap(
        test_config(SELF_HOSTED_STORE, SELF_HOSTED_BUS),
        harness.collaborators(),
    )
    .await
    .unwrap();

    assert_eq!(pipeline.shard_bootstrap(), &ShardBootstrap::Created);
    assert!(harness.store.is_sharded("k8orders", "orders"));
}

#[tokio::test]
async fn test_unreachable_legacy_bus_makes_publish_a_no_op() {
    let harness = TestHarness::with_parts(
        InMemoryDocumentStore::new(),
        InMemoryLegacyConnector::unreachable(),
        InMemoryManagedConnector::new(),
    );

    let pipeline = OrderPipeline::bootstrap(
        test_config(SELF_HOSTED_STORE, SELF_HOSTED_BUS),
        harness.collaborators(),
    )
    .await
    .unwrap();

    assert!(pipeline.is_ready());
    assert!(!pipeline.dispatcher().is_established());
    assert_eq!(harness.legacy.dial_count(), 3);

    harness.challenge.clear();
    for _ in 0..3 {
        let stored = pipeline.capture(&Order::new("buyer@example.com")).await.unwrap();
        assert!(stored.is_persisted());
    }

    assert_eq!(harness.legacy.dial_count(), 3, "no background reconnection");
    assert!(harness.legacy.published().is_empty());
    assert!(harness.challenge.exceptions().is_empty());
    assert!(harness
        .challenge
        .dependencies()
        .iter()
        .all(|d| d.name == "MongoDB"));
    assert_eq!(harness.store.documents("k8orders", "orders").len(), 3);
}

#[tokio::test]
async fn test_managed_session_failure_is_fatal() {
    let harness = TestHarness::with_parts(
        InMemoryDocumentStore::new(),
        InMemoryLegacyConnector::new(),
        InMemoryManagedConnector::new().with_connects([ConnectScript::FailSession]),
    );

    let error = OrderPipeline::bootstrap(test_config(MANAGED_STORE, MANAGED_BUS), harness.collaborators())
        .await
        .unwrap_err();

    assert!(error.is_fatal());
}

#[tokio::test]
async fn test_unreachable_managed_bus_is_not_fatal() {
    let harness = TestHarness::with_parts(
        InMemoryDocumentStore::new(),
        InMemoryLegacyConnector::new(),
        InMemoryManagedConnector::new().with_connects([ConnectScript::FailDial; 3]),
    );

    let pipeline =
        OrderPipeline::bootstrap(test_config(MANAGED_STORE, MANAGED_BUS), harness.collaborators())
            .await
            .unwrap();

    assert!(pipeline.is_ready());
    pipeline.capture(&Order::new("buyer@example.com")).await.unwrap();
    assert_eq!(harness.managed.send_attempts(), 0);
}

#[tokio::test]
async fn test_malformed_urls_are_fatal() {
    for (store, bus) in [("not a url", SELF_HOSTED_BUS), (SELF_HOSTED_STORE, "::")] {
        let harness = TestHarness::new();
        let error = OrderPipeline::bootstrap(test_config(store, bus), harness.collaborators())
            .await
            .unwrap_err();
        assert!(error.is_fatal(), "{store} / {bus} should be fatal");

        let exceptions = harness.challenge.exceptions();
        assert_eq!(exceptions.len(), 1);
        assert!(exceptions[0].starts_with("Invalid"), "{}", exceptions[0]);
        assert!(harness.challenge.dependencies().is_empty());
    }
}

#[tokio::test]
async fn test_store_session_failure_is_fatal() {
    let harness = TestHarness::with_parts(
        InMemoryDocumentStore::new().with_failing_ping(),
        InMemoryLegacyConnector::new(),
        InMemoryManagedConnector::new(),
    );

    let error = OrderPipeline::bootstrap(
        test_config(SELF_HOSTED_STORE, SELF_HOSTED_BUS),
        harness.collaborators(),
    )
    .await
    .unwrap_err();

    assert!(error.is_fatal());
    let session = &harness.challenge.dependencies()[0];
    assert_eq!(session.data, "Create session");
    assert!(!session.success);
    assert_eq!(harness.legacy.dial_count(), 0);
}

#[tokio::test]
async fn test_failed_insert_is_returned_and_not_published() {
    let harness = TestHarness::new();
    let pipeline = OrderPipeline::bootstrap(
        test_config(SELF_HOSTED_STORE, SELF_HOSTED_BUS),
        harness.collaborators(),
    )
    .await
    .unwrap();
    harness.store.set_fail_inserts(true);

    let error = pipeline.capture(&Order::new("buyer@example.com")).await.unwrap_err();

    assert!(!error.is_fatal());
    assert!(harness.legacy.published().is_empty());
    assert!(pipeline.is_ready());
}

#[tokio::test]
async fn test_failed_publish_does_not_fail_capture() {
    let harness = TestHarness::new();
    let pipeline = OrderPipeline::bootstrap(
        test_config(SELF_HOSTED_STORE, SELF_HOSTED_BUS),
        harness.collaborators(),
    )
    .await
    .unwrap();
    harness.legacy.set_fail_publish(true);

    let stored = pipeline.capture(&Order::new("buyer@example.com")).await.unwrap();

    assert!(stored.is_persisted());
    let send = harness
        .custom
        .dependencies()
        .into_iter()
        .find(|d| d.data == "Send message")
        .unwrap();
    assert!(!send.success);
    assert!(send.result_code.is_some());
}

#[tokio::test]
async fn test_pool_limit_caps_concurrent_inserts() {
    let harness = TestHarness::with_parts(
        InMemoryDocumentStore::new().with_insert_delay(Duration::from_millis(20)),
        InMemoryLegacyConnector::new(),
        InMemoryManagedConnector::new(),
    );
    let mut config = test_config(SELF_HOSTED_STORE, SELF_HOSTED_BUS);
    config.pool_limit = 2;

    let pipeline = std::sync::Arc::new(
        OrderPipeline::bootstrap(config, harness.collaborators()).await.unwrap(),
    );

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let pipeline = pipeline.clone();
            tokio::spawn(async move {
                pipeline
                    .insert(&Order::new(format!("buyer{i}@example.com")))
                    .await
            })
        })
        .collect();
    for result in futures::future::join_all(tasks).await {
        result.unwrap().unwrap();
    }

    assert_eq!(harness.store.documents("k8orders", "orders").len(), 8);
    assert!(harness.store.peak_concurrent_inserts() <= 2);
}

#[tokio::test]
async fn test_ids_unique_and_partitions_in_range() {
    let harness = TestHarness::new();
    let pipeline = OrderPipeline::bootstrap(
        test_config(SELF_HOSTED_STORE, SELF_HOSTED_BUS),
        harness.collaborators(),
    )
    .await
    .unwrap();

    let mut ids = std::collections::HashSet::new();
    for _ in 0..100 {
        let order = Order::new("buyer@example.com");
        assert!(order.id.is_empty());
        let stored = pipeline.insert(&order).await.unwrap();
        assert!(ids.insert(stored.id.clone()));
        assert!(partition_index(&stored.partition).is_some_and(|k| k < 11));
    }
}

#[tokio::test]
async fn test_shutdown_closes_bus_and_leaves_ready_state() {
    let harness = TestHarness::new();
    let pipeline = OrderPipeline::bootstrap(
        test_config(SELF_HOSTED_STORE, SELF_HOSTED_BUS),
        harness.collaborators(),
    )
    .await
    .unwrap();

    pipeline.shutdown().await;

    assert!(!pipeline.is_ready());
    assert!(harness.legacy.is_closed());
    assert!(harness.store.is_closed());
}

#[tokio::test]
async fn test_direct_publish_of_unstored_order_is_refused() {
    for (store, bus) in [(SELF_HOSTED_STORE, SELF_HOSTED_BUS), (MANAGED_STORE, MANAGED_BUS)] {
        let harness = TestHarness::new();
        let pipeline = OrderPipeline::bootstrap(test_config(store, bus), harness.collaborators())
            .await
            .unwrap();
        harness.challenge.clear();

        pipeline.publish(&Order::new("buyer@example.com")).await;

        assert!(harness.legacy.published().is_empty());
        assert_eq!(harness.managed.send_attempts(), 0);
        assert!(harness.challenge.dependencies().is_empty());
        assert!(harness.challenge.events().is_empty());
    }
}
