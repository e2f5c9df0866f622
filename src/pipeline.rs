//! # Order Pipeline
//!
//! Startup wiring and the per-order path.
//!
//! ## Bootstrap sequence
//!
//! 1. Report configured environment variables
//! 2. Create telemetry collectors
//! 3. Classify the store and bus URLs (fatal on a parse error, recorded as an exception)
//! 4. Open the store session (fatal on failure)
//! 5. Shard the orders collection (never fatal)
//! 6. Establish the bus publisher (fatal only for a managed session failure)
//! 7. Log `** READY TO TAKE ORDERS **`
//!
//! ## Per order
//!
//! [`OrderPipeline::capture`] records the initial-order event, inserts the
//! order, and publishes it only if the insert succeeded. Callers that want to
//! sequence the steps themselves use [`track_initial_order`](OrderPipeline::track_initial_order),
//! [`insert`](OrderPipeline::insert) and [`publish`](OrderPipeline::publish).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{info, instrument};

use crate::backend::BackendSelection;
use crate::config::PipelineConfig;
use crate::constants::events;
use crate::database::{DocumentStore, DocumentStoreClient, ShardBootstrap, StoreError};
use crate::error::{PipelineError, Result};
use crate::messaging::{BusConnectors, MessageDispatcher};
use crate::models::Order;
use crate::telemetry::{BusinessEvent, TelemetryRecorder};

/// External clients the pipeline is built from
///
/// Unset fields fall back to the production clients: the MongoDB driver and
/// OTLP collectors built from [`PipelineConfig`].
#[derive(Debug, Clone)]
pub struct PipelineCollaborators {
    pub store: Option<Arc<dyn DocumentStore>>,
    pub buses: BusConnectors,
    pub telemetry: Option<TelemetryRecorder>,
}

impl Default for PipelineCollaborators {
    fn default() -> Self {
        Self {
            store: None,
            buses: BusConnectors::production(),
            telemetry: None,
        }
    }
}

impl PipelineCollaborators {
    pub fn with_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_buses(mut self, buses: BusConnectors) -> Self {
        self.buses = buses;
        self
    }

    pub fn with_telemetry(mut self, telemetry: TelemetryRecorder) -> Self {
        self.telemetry = Some(telemetry);
        self
    }
}

#[derive(Debug)]
pub struct OrderPipeline {
    config: PipelineConfig,
    selection: BackendSelection,
    store: DocumentStoreClient,
    dispatcher: MessageDispatcher,
    telemetry: TelemetryRecorder,
    shard_bootstrap: ShardBootstrap,
    ready: AtomicBool,
}

impl OrderPipeline {
    /// Connect everything and become ready to take orders
    ///
    /// An `Err` here is always fatal, see [`PipelineError::is_fatal`].
    pub async fn bootstrap(
        config: PipelineConfig,
        collaborators: PipelineCollaborators,
    ) -> Result<Self> {
        config.report();

        let telemetry = collaborators
            .telemetry
            .unwrap_or_else(|| TelemetryRecorder::from_config(&config));

        let selection = match BackendSelection::classify(&config.store_url, &config.bus_url) {
            Ok(selection) => selection,
            Err(e) => {
                telemetry.track_exception(&e);
                telemetry.shutdown();
                return Err(e.into());
            }
        };

        info!(backend = %selection.store, "Attempting to connect to the document store");
        let store = match collaborators.store {
            Some(store) => {
                DocumentStoreClient::open(store, selection.store, &config, telemetry.clone()).await?
            }
            None => DocumentStoreClient::connect(&config, selection.store, telemetry.clone()).await?,
        };

        let shard_bootstrap = store.bootstrap_sharding().await;

        let dispatcher = MessageDispatcher::establish(
            &selection,
            &collaborators.buses,
            &config,
            telemetry.clone(),
        )
        .await?;

        info!(
            store = %selection.store,
            bus = %selection.bus,
            bus_established = dispatcher.is_established(),
            "** READY TO TAKE ORDERS **"
        );

        Ok(Self {
            config,
            selection,
            store,
            dispatcher,
            telemetry,
            shard_bootstrap,
            ready: AtomicBool::new(true),
        })
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    pub fn selection(&self) -> &BackendSelection {
        &self.selection
    }

    pub fn shard_bootstrap(&self) -> &ShardBootstrap {
        &self.shard_bootstrap
    }

    pub fn store(&self) -> &DocumentStoreClient {
        &self.store
    }

    pub fn dispatcher(&self) -> &MessageDispatcher {
        &self.dispatcher
    }

    pub fn telemetry(&self) -> &TelemetryRecorder {
        &self.telemetry
    }

    /// Record that an order arrived, before it is stored
    pub fn track_initial_order(&self, order: &Order) {
        self.telemetry.track_event(&BusinessEvent::order_step(
            events::INITIAL_ORDER,
            &self.config.team_name,
            events::SEQUENCE_INITIAL,
            "http",
            &order.id,
        ));
    }

    pub async fn insert(&self, order: &Order) -> std::result::Result<Order, StoreError> {
        self.store.insert(order).await
    }

    pub async fn publish(&self, order: &Order) {
        self.dispatcher.publish(order).await;
    }

    /// Track, store and announce one order
    ///
    /// Only the store write can fail the call; a failed publish is absorbed.
    #[instrument(skip(self, order), fields(email = %order.email))]
    pub async fn capture(&self, order: &Order) -> Result<Order> {
        self.track_initial_order(order);
        let stored = self.insert(order).await.map_err(PipelineError::from)?;
        self.publish(&stored).await;
        Ok(stored)
    }

    /// Close the bus, stop lending store sessions and flush telemetry
    pub async fn shutdown(&self) {
        info!("Shutting down order pipeline");
        self.ready.store(false, Ordering::SeqCst);
        self.dispatcher.close().await;
        self.store.close().await;
        self.telemetry.shutdown();
    }
}
