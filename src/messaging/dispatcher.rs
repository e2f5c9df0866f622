//! # Message Dispatcher
//!
//! Routes publishes to the publisher matching the bus variant chosen at
//! startup. Publishing never surfaces an error to the caller: storage is the
//! source of truth and the bus is a best-effort notification.

use std::sync::Arc;

use tracing::info;

use super::legacy::LegacyBusPublisher;
use super::managed::ManagedBusPublisher;
use super::traits::{LegacyBusConnector, ManagedBusConnector};
use super::BusError;
use crate::backend::{BackendSelection, BusVariant};
use crate::config::PipelineConfig;
use crate::models::Order;
use crate::telemetry::TelemetryRecorder;

/// Bus clients available to the dispatcher; only the selected one is dialled
#[derive(Debug, Clone)]
pub struct BusConnectors {
    pub legacy: Arc<dyn LegacyBusConnector>,
    pub managed: Arc<dyn ManagedBusConnector>,
}

impl BusConnectors {
    /// Connectors speaking the real wire protocols
    pub fn production() -> Self {
        Self {
            legacy: Arc::new(super::providers::RabbitMqConnector::new()),
            managed: Arc::new(super::providers::ServiceBusConnector::new()),
        }
    }
}

#[derive(Debug)]
pub enum MessageDispatcher {
    Legacy(LegacyBusPublisher),
    Managed(ManagedBusPublisher),
}

impl MessageDispatcher {
    /// Establish the publisher for the selected bus
    ///
    /// Only a managed-bus session failure is returned as an error.
    pub async fn establish(
        selection: &BackendSelection,
        connectors: &BusConnectors,
        config: &PipelineConfig,
        telemetry: TelemetryRecorder,
    ) -> Result<Self, BusError> {
        info!(bus = %selection.bus, "Initializing message bus");
        match selection.bus {
            BusVariant::SelfHosted => Ok(Self::Legacy(
                LegacyBusPublisher::establish(Arc::clone(&connectors.legacy), config, telemetry).await,
            )),
            BusVariant::Managed => Ok(Self::Managed(
                ManagedBusPublisher::establish(
                    Arc::clone(&connectors.managed),
                    config,
                    &selection.bus_entity,
                    telemetry,
                )
                .await?,
            )),
        }
    }

    /// Announce a stored order; a no-op when the bus never came up
    pub async fn publish(&self, order: &Order) {
        match self {
            Self::Legacy(publisher) => publisher.publish(order).await,
            Self::Managed(publisher) => publisher.publish(order).await,
        }
    }

    pub fn variant(&self) -> BusVariant {
        match self {
            Self::Legacy(_) => BusVariant::SelfHosted,
            Self::Managed(_) => BusVariant::Managed,
        }
    }

    pub fn provider_name(&self) -> &'static str {
        match self {
            Self::Legacy(_) => "rabbitmq",
            Self::Managed(_) => "servicebus",
        }
    }

    pub fn is_established(&self) -> bool {
        match self {
            Self::Legacy(publisher) => publisher.is_established(),
            Self::Managed(publisher) => publisher.is_established(),
        }
    }

    pub async fn close(&self) {
        match self {
            Self::Legacy(publisher) => publisher.close().await,
            Self::Managed(publisher) => publisher.close().await,
        }
    }
}
