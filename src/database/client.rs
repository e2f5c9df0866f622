//! # Document Store Client
//!
//! Owns the process-wide store session pool and performs the partitioned
//! order insert and the one-time shard bootstrap.
//!
//! ## Insert
//!
//! Each insert borrows a session from the [`SessionPool`], assigns the order's
//! `partition`, `id` and `status`, defaults its `source`, and writes it once.
//! A failed write is returned to the caller and never retried here.
//!
//! ## Shard bootstrap
//!
//! Shards the orders collection on a hashed `partition` key. Every run after
//! the first fails because the collection is already sharded; that outcome is
//! reported as [`ShardBootstrap::Skipped`], not as an error.

use std::sync::Arc;

use mongodb::bson::oid::ObjectId;
use opentelemetry::KeyValue;
use rand::Rng;
use tracing::{error, info, instrument};

use super::connection::MongoDocumentStore;
use super::pool::SessionPool;
use super::store::DocumentStore;
use super::StoreError;
use crate::backend::{redact_url, StoreVariant};
use crate::config::PipelineConfig;
use crate::constants::{dependencies, events, order as order_consts, store};
use crate::models::Order;
use crate::telemetry::{metrics, BusinessEvent, DependencyCall, TelemetryRecorder};

/// Outcome of the startup shard bootstrap
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShardBootstrap {
    /// The collection was sharded by this run
    Created,
    /// The command failed, usually because an earlier run already sharded it
    Skipped(String),
}

#[derive(Debug, Clone)]
pub struct DocumentStoreClient {
    pool: SessionPool,
    variant: StoreVariant,
    target: String,
    team_name: String,
    default_source: String,
    telemetry: TelemetryRecorder,
}

impl DocumentStoreClient {
    /// Open the store session, recording it as a `Create session` dependency
    pub async fn connect(
        config: &PipelineConfig,
        variant: StoreVariant,
        telemetry: TelemetryRecorder,
    ) -> Result<Self, StoreError> {
        let call = DependencyCall::new(
            variant.name(),
            dependencies::STORE_KIND,
            redact_url(&config.store_url),
            dependencies::CREATE_SESSION,
        );

        let store = telemetry
            .observe(
                &call,
                MongoDocumentStore::connect(
                    &config.store_url,
                    config.pool_limit,
                    config.store_connect_timeout,
                ),
            )
            .await
            .inspect_err(|e| error!(backend = %variant, error = %e, "Can't create store session"))?;

        Ok(Self::new(Arc::new(store), variant, config, telemetry))
    }

    /// Verify a caller-provided store with a ping, recorded as `Create session`
    pub async fn open(
        store: Arc<dyn DocumentStore>,
        variant: StoreVariant,
        config: &PipelineConfig,
        telemetry: TelemetryRecorder,
    ) -> Result<Self, StoreError> {
        let call = DependencyCall::new(
            variant.name(),
            dependencies::STORE_KIND,
            redact_url(&config.store_url),
            dependencies::CREATE_SESSION,
        );

        telemetry
            .observe(&call, store.ping())
            .await
            .inspect_err(|e| error!(backend = %variant, error = %e, "Can't create store session"))?;

        info!(backend = %variant, provider = store.provider_name(), "Store session ready");
        Ok(Self::new(store, variant, config, telemetry))
    }

    /// Wrap an already connected store
    pub fn new(
        store: Arc<dyn DocumentStore>,
        variant: StoreVariant,
        config: &PipelineConfig,
        telemetry: TelemetryRecorder,
    ) -> Self {
        Self {
            pool: SessionPool::new(store, config.pool_limit),
            variant,
            target: redact_url(&config.store_url),
            team_name: config.team_name.clone(),
            default_source: config.default_source.clone(),
            telemetry,
        }
    }

    pub fn variant(&self) -> StoreVariant {
        self.variant
    }

    pub fn pool(&self) -> &SessionPool {
        &self.pool
    }

    /// Persist a new order and return the stored copy
    ///
    /// The input is left untouched so a caller can retry or compensate with
    /// the original on failure.
    #[instrument(skip(self, order), fields(backend = %self.variant))]
    pub async fn insert(&self, order: &Order) -> Result<Order, StoreError> {
        let session = self.pool.acquire().await?;

        let mut stored = order.clone();
        stored.partition = random_partition(&mut rand::thread_rng());
        stored.id = ObjectId::new().to_hex();
        stored.status = order_consts::STATUS_OPEN.to_string();
        if stored.needs_default_source() {
            stored.source = Some(self.default_source.clone()).filter(|s| !s.is_empty());
        }

        let call = DependencyCall::new(
            self.variant.name(),
            dependencies::STORE_KIND,
            self.target.clone(),
            dependencies::INSERT_ORDER,
        );
        let labels = [KeyValue::new("backend", self.variant.name())];

        let result = self
            .telemetry
            .observe(
                &call,
                session.insert_order(store::DATABASE_NAME, store::COLLECTION_NAME, &stored),
            )
            .await;

        match result {
            Ok(()) => {
                self.telemetry.track_event(&BusinessEvent::order_step(
                    format!("CaptureOrder to {}", self.variant),
                    &self.team_name,
                    events::SEQUENCE_STORED,
                    self.variant.name(),
                    &stored.id,
                ));
                metrics::orders_inserted_total().add(1, &labels);
                info!(order_id = %stored.id, partition = %stored.partition, "Inserted order");
                Ok(stored)
            }
            Err(e) => {
                metrics::order_insert_failures_total().add(1, &labels);
                error!(error = %e, "Failed to insert order");
                Err(e)
            }
        }
    }

    /// Shard the orders collection on the partition key
    ///
    /// Never fails: an error is recorded as an exception and logged at info.
    pub async fn bootstrap_sharding(&self) -> ShardBootstrap {
        let session = match self.pool.acquire().await {
            Ok(session) => session,
            Err(e) => return ShardBootstrap::Skipped(e.to_string()),
        };

        let result = session
            .shard_collection(store::DATABASE_NAME, store::COLLECTION_NAME, store::SHARD_KEY)
            .await;

        match result {
            Ok(()) => {
                info!(
                    collection = store::COLLECTION_NAME,
                    shard_key = store::SHARD_KEY,
                    "Sharded orders collection"
                );
                ShardBootstrap::Created
            }
            Err(e) => {
                self.telemetry.track_exception(&e);
                info!(
                    error = %e,
                    "Could not shard the orders collection, it is probably already sharded"
                );
                ShardBootstrap::Skipped(e.to_string())
            }
        }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Pick a uniformly random `partition-<k>` with `0 <= k < PARTITION_COUNT`
pub fn random_partition<R: Rng + ?Sized>(rng: &mut R) -> String {
    let k = rng.gen_range(0..store::PARTITION_COUNT);
    format!("{}{k}", store::PARTITION_PREFIX)
}

/// Parse the `k` of a `partition-<k>` value
pub fn partition_index(partition: &str) -> Option<u32> {
    partition
        .strip_prefix(store::PARTITION_PREFIX)?
        .parse()
        .ok()
}
