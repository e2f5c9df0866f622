//! Property checks over arbitrary inbound orders.

mod common;

use common::*;
use order_dispatch::database::partition_index;
use order_dispatch::models::{Order, OrderEnvelope};
use order_dispatch::pipeline::OrderPipeline;
use proptest::prelude::*;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_stored_order_is_normalized(order in inbound_order_strategy()) {
        let rt = runtime();
        let harness = TestHarness::new();
        let pipeline = rt
            .block_on(OrderPipeline::bootstrap(
                test_config(SELF_HOSTED_STORE, SELF_HOSTED_BUS),
                harness.collaborators(),
            ))
            .unwrap();

        let stored = rt.block_on(pipeline.capture(&order)).unwrap();

        prop_assert_eq!(stored.status.as_str(), "Open");
        prop_assert_eq!(stored.id.len(), 24);
        prop_assert!(partition_index(&stored.partition).is_some_and(|k| k < 11));
        prop_assert_eq!(&stored.email, &order.email);
        prop_assert_eq!(&stored.product, &order.product);
        prop_assert_eq!(stored.total, order.total);

        // caller's copy is untouched
        prop_assert!(order.id.is_empty());

        let expected_source = match order.source.as_deref() {
            None | Some("") | Some("string") => Some("integration".to_string()),
            Some(other) => Some(other.to_string()),
        };
        prop_assert_eq!(&stored.source, &expected_source);

        let envelopes = harness.legacy.published_envelopes();
        prop_assert_eq!(envelopes, vec![OrderEnvelope { order: stored.id.clone(), source: TEAM.to_string() }]);
    }

    #[test]
    fn prop_order_json_survives_the_wire(order in inbound_order_strategy()) {
        let json = serde_json::to_string(&order).unwrap();
        let parsed: Order = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(parsed.email, order.email);
        prop_assert_eq!(parsed.status, order.status);
        prop_assert_eq!(parsed.source, order.source);
    }
}
