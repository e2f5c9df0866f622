//! # System Constants
//!
//! Fixed names shared by the store, the two bus protocols and telemetry.
//! Consumers built against the capture service depend on these values, so
//! they are not configurable.

/// Document store layout
pub mod store {
    pub const DATABASE_NAME: &str = "k8orders";
    pub const COLLECTION_NAME: &str = "orders";
    pub const SHARD_KEY: &str = "partition";

    /// Partitions are `partition-0` .. `partition-10`
    pub const PARTITION_COUNT: u32 = 11;
    pub const PARTITION_PREFIX: &str = "partition-";

    pub const DEFAULT_POOL_LIMIT: usize = 25;
    pub const CONNECT_TIMEOUT_MS: u64 = 10_000;

    /// Managed (geo-distributed) deployments are recognised by this host suffix
    pub const MANAGED_HOST_MARKER: &str = "documents.azure.com";
}

/// Message bus layout
pub mod bus {
    /// Durable queue declared on the self-hosted broker
    pub const LEGACY_QUEUE_NAME: &str = "order";
    pub const CONTENT_TYPE_JSON: &str = "application/json";
    /// AMQP 0.9.1 delivery mode for persistent messages
    pub const PERSISTENT_DELIVERY_MODE: u8 = 2;

    pub const SEND_TIMEOUT_MS: u64 = 5_000;

    /// Managed cloud bus namespaces are recognised by this host suffix
    pub const MANAGED_HOST_MARKER: &str = "servicebus.windows.net";
}

/// Establishment and publish retry defaults
pub mod retry {
    pub const MAX_ATTEMPTS: u32 = 3;
    pub const DELAY_MS: u64 = 5_000;
}

/// Order field values owned by the core
pub mod order {
    pub const STATUS_OPEN: &str = "Open";
    /// Placeholder submitted by API explorers for the `source` field
    pub const SOURCE_PLACEHOLDER: &str = "string";
}

/// Business event names and properties
pub mod events {
    pub const SERVICE_NAME: &str = "CaptureOrder";
    pub const CLOUD_ROLE: &str = "captureorder";

    pub const INITIAL_ORDER: &str = "Initial order";

    pub const SEQUENCE_INITIAL: &str = "0";
    pub const SEQUENCE_STORED: &str = "1";
    pub const SEQUENCE_PUBLISHED: &str = "2";

    pub const PROP_TEAM: &str = "team";
    pub const PROP_SEQUENCE: &str = "sequence";
    pub const PROP_TYPE: &str = "type";
    pub const PROP_SERVICE: &str = "service";
    pub const PROP_ORDER_ID: &str = "orderId";
}

/// Dependency record descriptors
pub mod dependencies {
    pub const STORE_KIND: &str = "MongoDB";
    pub const BUS_KIND: &str = "AMQP";

    pub const INSERT_ORDER: &str = "Insert order";
    pub const CREATE_SESSION: &str = "Create session";
    pub const SEND_MESSAGE: &str = "Send message";
}
