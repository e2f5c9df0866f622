//! # Backend Selection
//!
//! Classifies the document-store and message-bus connection strings once, at
//! startup, into self-hosted or managed deployments. The resulting
//! [`BackendSelection`] is immutable and copied into every component that
//! branches on backend identity; a changed backend requires a restart.

use std::fmt;

use thiserror::Error;
use tracing::info;
use url::Url;

use crate::constants;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("Invalid {backend} URL {url}: {reason}")]
    InvalidUrl {
        backend: String,
        url: String,
        reason: String,
    },
}

impl BackendError {
    pub fn invalid_url(
        backend: impl Into<String>,
        url: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidUrl {
            backend: backend.into(),
            url: url.into(),
            reason: reason.into(),
        }
    }
}

/// Which document store deployment is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreVariant {
    /// Self-hosted MongoDB
    SelfHosted,
    /// Managed, geo-distributed store speaking the MongoDB wire protocol
    Managed,
}

impl StoreVariant {
    /// Name used in logs, event names and dependency records
    pub fn name(&self) -> &'static str {
        match self {
            Self::SelfHosted => "MongoDB",
            Self::Managed => "CosmosDB",
        }
    }
}

impl fmt::Display for StoreVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which message bus protocol is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BusVariant {
    /// Self-hosted broker over AMQP 0.9.1
    SelfHosted,
    /// Managed cloud bus over AMQP 1.0
    Managed,
}

impl BusVariant {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SelfHosted => "RabbitMQ",
            Self::Managed => "ServiceBus",
        }
    }

    /// Lower-case tag used as the `type` property of publish events
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::SelfHosted => "rabbitmq",
            Self::Managed => "servicebus",
        }
    }
}

impl fmt::Display for BusVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The process-wide backend decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendSelection {
    pub store: StoreVariant,
    pub bus: BusVariant,
    /// Target address for the managed bus, taken from the bus URL path
    pub bus_entity: String,
}

impl BackendSelection {
    /// Classify both connection strings
    ///
    /// Either URL failing to parse is a fatal startup error.
    pub fn classify(store_url: &str, bus_url: &str) -> Result<Self, BackendError> {
        let parsed_store = Url::parse(store_url)
            .map_err(|e| BackendError::invalid_url("store", redact_url(store_url), e.to_string()))?;
        let parsed_bus = Url::parse(bus_url).map_err(|e| {
            BackendError::invalid_url(
                "bus",
                redact_url(bus_url),
                format!("{e}. Make sure the policy key is URL encoded"),
            )
        })?;

        let store = if store_url.contains(constants::store::MANAGED_HOST_MARKER) {
            StoreVariant::Managed
        } else {
            StoreVariant::SelfHosted
        };

        let bus = if bus_url.contains(constants::bus::MANAGED_HOST_MARKER) {
            BusVariant::Managed
        } else {
            BusVariant::SelfHosted
        };

        let bus_entity = parsed_bus.path().trim_start_matches('/').to_string();

        info!(
            store = %store,
            store_host = parsed_store.host_str().unwrap_or_default(),
            bus = %bus,
            bus_host = parsed_bus.host_str().unwrap_or_default(),
            bus_entity = %bus_entity,
            "Backends selected"
        );

        Ok(Self {
            store,
            bus,
            bus_entity,
        })
    }
}

/// Strip the password from a connection string for logging and telemetry
///
/// Strings that do not parse are returned as their scheme only, since they
/// may still carry credentials.
pub fn redact_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some("***"));
            }
            url.to_string()
        }
        Err(_) => match raw.find("://") {
            Some(end) => format!("{}...", &raw[..end + 3]),
            None => "...".to_string(),
        },
    }
}
