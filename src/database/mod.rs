//! # Document Store
//!
//! Persists orders to a MongoDB-compatible document store, self-hosted or
//! managed. Both deployments speak the same wire protocol, so one driver
//! adapter serves both; the [`StoreVariant`](crate::backend::StoreVariant)
//! only changes names in logs and telemetry.
//!
//! ## Key Components
//!
//! - [`DocumentStoreClient`] - partitioned insert and shard bootstrap
//! - [`SessionPool`] - hard cap on concurrent store operations
//! - [`DocumentStore`] - driver seam, with [`MongoDocumentStore`] and
//!   [`InMemoryDocumentStore`] implementations

pub mod client;
pub mod connection;
pub mod errors;
pub mod in_memory;
pub mod pool;
pub mod store;

pub use client::{partition_index, random_partition, DocumentStoreClient, ShardBootstrap};
pub use connection::MongoDocumentStore;
pub use errors::StoreError;
pub use in_memory::InMemoryDocumentStore;
pub use pool::{SessionHandle, SessionPool};
pub use store::DocumentStore;
