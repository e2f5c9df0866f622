//! # In-Memory Document Store
//!
//! A [`DocumentStore`] backed by `DashMap`, for tests and local runs without a
//! database. Failures can be scripted, and the highest number of concurrently
//! running inserts is tracked so tests can observe the pool cap.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use tracing::debug;

use super::store::DocumentStore;
use super::StoreError;
use crate::models::Order;

#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    /// `"<database>.<collection>"` -> documents
    collections: DashMap<String, Vec<Order>>,
    sharded: DashSet<String>,
    fail_inserts: AtomicBool,
    fail_ping: AtomicBool,
    insert_delay: Option<Duration>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    closed: AtomicBool,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts sleep for `delay` while counted as in flight
    pub fn with_insert_delay(mut self, delay: Duration) -> Self {
        self.insert_delay = Some(delay);
        self
    }

    /// Pretend `database.collection` was sharded by an earlier run
    pub fn with_collection_already_sharded(self, database: &str, collection: &str) -> Self {
        self.sharded.insert(namespace(database, collection));
        self
    }

    pub fn with_failing_ping(self) -> Self {
        self.fail_ping.store(true, Ordering::SeqCst);
        self
    }

    pub fn set_fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn documents(&self, database: &str, collection: &str) -> Vec<Order> {
        self.collections
            .get(&namespace(database, collection))
            .map(|docs| docs.value().clone())
            .unwrap_or_default()
    }

    pub fn is_sharded(&self, database: &str, collection: &str) -> bool {
        self.sharded.contains(&namespace(database, collection))
    }

    /// Highest number of inserts observed running at the same time
    pub fn peak_concurrent_inserts(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn ping(&self) -> Result<(), StoreError> {
        if self.fail_ping.load(Ordering::SeqCst) {
            return Err(StoreError::session("no reachable servers"));
        }
        Ok(())
    }

    async fn insert_order(
        &self,
        database: &str,
        collection: &str,
        order: &Order,
    ) -> Result<(), StoreError> {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);

        if let Some(delay) = self.insert_delay {
            tokio::time::sleep(delay).await;
        }

        let result = if self.fail_inserts.load(Ordering::SeqCst) {
            Err(StoreError::insert(collection, "scripted insert failure"))
        } else {
            self.collections
                .entry(namespace(database, collection))
                .or_default()
                .push(order.clone());
            debug!(order_id = %order.id, collection, "Order stored in memory");
            Ok(())
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn shard_collection(
        &self,
        database: &str,
        collection: &str,
        _shard_key: &str,
    ) -> Result<(), StoreError> {
        if !self.sharded.insert(namespace(database, collection)) {
            return Err(StoreError::command(
                "shardCollection",
                format!("sharding already enabled for collection {database}.{collection}"),
            ));
        }
        Ok(())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn provider_name(&self) -> &'static str {
        "in_memory"
    }
}

fn namespace(database: &str, collection: &str) -> String {
    format!("{database}.{collection}")
}
