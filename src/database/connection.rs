//! # MongoDB Connection
//!
//! MongoDB wire-protocol driver adapter, used for both the self-hosted store
//! and the managed store's MongoDB-compatible API.
//!
//! The driver's `Client` owns the socket pool. `max_pool_size` is a hard cap:
//! operations beyond it wait inside the driver for a socket to be checked in.

use std::time::Duration;

use async_trait::async_trait;
use mongodb::bson::{doc, Document};
use mongodb::options::ClientOptions;
use mongodb::Client;
use tracing::{debug, info};

use super::store::DocumentStore;
use super::StoreError;
use crate::constants;
use crate::models::Order;

#[derive(Debug, Clone)]
pub struct MongoDocumentStore {
    client: Client,
}

impl MongoDocumentStore {
    /// Connect and verify the session with a ping
    ///
    /// Credentials, hosts and TLS (`ssl=true` / `tls=true`) come from the URL.
    pub async fn connect(
        url: &str,
        pool_limit: usize,
        connect_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(url)
            .await
            .map_err(|e| StoreError::session(format!("Invalid store connection string: {e}")))?;

        options.app_name = Some(constants::events::CLOUD_ROLE.to_string());
        options.max_pool_size = Some(pool_limit as u32);
        options.connect_timeout = Some(connect_timeout);
        options.server_selection_timeout = Some(connect_timeout);

        info!(
            hosts = ?options.hosts,
            username = options.credential.as_ref().and_then(|c| c.username.as_deref()).unwrap_or_default(),
            tls = options.tls.is_some(),
            pool_limit,
            "Connecting to document store"
        );

        let client = Client::with_options(options)
            .map_err(|e| StoreError::session(format!("Store client creation failed: {e}")))?;

        let store = Self { client };
        store.ping().await?;

        info!("Connected to document store");
        Ok(store)
    }

}

#[async_trait]
impl DocumentStore for MongoDocumentStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.client
            .database(constants::store::DATABASE_NAME)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| StoreError::session(format!("Store ping failed: {e}")))?;
        Ok(())
    }

    async fn insert_order(
        &self,
        database: &str,
        collection: &str,
        order: &Order,
    ) -> Result<(), StoreError> {
        let result = self
            .client
            .database(database)
            .collection::<Order>(collection)
            .insert_one(order)
            .await
            .map_err(|e| StoreError::insert(collection, e.to_string()))?;

        debug!(inserted_id = %result.inserted_id, order_id = %order.id, "Order document inserted");
        Ok(())
    }

    async fn shard_collection(
        &self,
        database: &str,
        collection: &str,
        shard_key: &str,
    ) -> Result<(), StoreError> {
        let mut key = Document::new();
        key.insert(shard_key, "hashed");

        let command = doc! {
            "shardCollection": format!("{database}.{collection}"),
            "key": key,
        };

        let result = self
            .client
            .database(database)
            .run_command(command)
            .await
            .map_err(|e| StoreError::command("shardCollection", e.to_string()))?;

        debug!(result = %result, "shardCollection completed");
        Ok(())
    }

    async fn close(&self) {
        self.client.clone().shutdown().await;
        info!("Document store client shut down");
    }

    fn provider_name(&self) -> &'static str {
        "mongodb"
    }
}
