//! # Pipeline Metrics
//!
//! OpenTelemetry instruments for store writes and bus publishes. They report
//! through the global meter provider, so they cost nothing until the host
//! process installs one.

use opentelemetry::metrics::{Counter, Histogram, Meter};
use std::sync::OnceLock;

static PIPELINE_METER: OnceLock<Meter> = OnceLock::new();

fn meter() -> &'static Meter {
    PIPELINE_METER.get_or_init(|| opentelemetry::global::meter("order-dispatch"))
}

/// Orders written to the document store
///
/// Labels:
/// - backend: MongoDB, CosmosDB
pub fn orders_inserted_total() -> Counter<u64> {
    meter()
        .u64_counter("orders.inserted.total")
        .with_description("Total number of orders written to the document store")
        .build()
}

/// Failed document store writes
///
/// Labels:
/// - backend: MongoDB, CosmosDB
pub fn order_insert_failures_total() -> Counter<u64> {
    meter()
        .u64_counter("orders.insert.failures.total")
        .with_description("Total number of failed order inserts")
        .build()
}

/// Envelopes accepted by the bus
///
/// Labels:
/// - backend: RabbitMQ, ServiceBus
pub fn messages_published_total() -> Counter<u64> {
    meter()
        .u64_counter("messages.published.total")
        .with_description("Total number of order envelopes published")
        .build()
}

/// Publishes that failed after all attempts
///
/// Labels:
/// - backend: RabbitMQ, ServiceBus
pub fn message_publish_failures_total() -> Counter<u64> {
    meter()
        .u64_counter("messages.publish.failures.total")
        .with_description("Total number of failed publishes")
        .build()
}

/// Managed bus link rebuilds
pub fn bus_reconnects_total() -> Counter<u64> {
    meter()
        .u64_counter("bus.reconnects.total")
        .with_description("Total number of managed bus client/session/sender rebuilds")
        .build()
}

/// Remote call duration in milliseconds
///
/// Labels:
/// - dependency: MongoDB, CosmosDB, RabbitMQ, ServiceBus
/// - operation: Insert order, Create session, Send message
/// - success: true, false
pub fn dependency_duration() -> Histogram<f64> {
    meter()
        .f64_histogram("dependency.duration")
        .with_description("Remote call duration in milliseconds")
        .with_unit("ms")
        .build()
}
