//! # Document Store Trait
//!
//! The operations the pipeline needs from a document store driver. Production
//! uses [`MongoDocumentStore`](super::MongoDocumentStore); tests substitute
//! [`InMemoryDocumentStore`](super::InMemoryDocumentStore).

use std::fmt;

use async_trait::async_trait;

use super::StoreError;
use crate::models::Order;

#[async_trait]
pub trait DocumentStore: Send + Sync + fmt::Debug + 'static {
    /// Round-trip to the server to prove the session is usable
    async fn ping(&self) -> Result<(), StoreError>;

    /// Insert one order document
    async fn insert_order(
        &self,
        database: &str,
        collection: &str,
        order: &Order,
    ) -> Result<(), StoreError>;

    /// Shard `database.collection` on a hashed `shard_key`
    ///
    /// Fails when the collection is already sharded or the deployment does not
    /// support sharding.
    async fn shard_collection(
        &self,
        database: &str,
        collection: &str,
        shard_key: &str,
    ) -> Result<(), StoreError>;

    /// Release driver resources; called once at shutdown
    async fn close(&self) {}

    fn provider_name(&self) -> &'static str;
}
