//! Proptest strategies for inbound orders.

use order_dispatch::models::Order;
use proptest::prelude::*;

pub fn status_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("Open".to_string()),
        Just("Shipped".to_string()),
        "[A-Za-z]{1,12}",
    ]
}

pub fn source_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some(String::new())),
        Just(Some("string".to_string())),
        "[a-z]{1,10}".prop_map(Some),
    ]
}

/// Orders as a caller would submit them: no id, no partition
pub fn inbound_order_strategy() -> impl Strategy<Value = Order> {
    (
        "[a-z]{1,10}@[a-z]{1,8}\\.com",
        proptest::option::of("[a-z]{2}-[A-Z]{2}"),
        proptest::option::of("[a-z ]{1,20}"),
        proptest::option::of(0.0f64..10_000.0),
        source_strategy(),
        status_strategy(),
    )
        .prop_map(|(email, language, product, total, source, status)| Order {
            email,
            preferred_language: language,
            product,
            total,
            source,
            status,
            ..Default::default()
        })
}
