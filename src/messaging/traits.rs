//! # Bus Client Seams
//!
//! The wire-level clients for both protocols sit behind these traits, so the
//! publishers can be driven by scripted fakes in tests.
//!
//! | Protocol | Connector | Live handle |
//! |---|---|---|
//! | AMQP 0.9.1 (self-hosted broker) | [`LegacyBusConnector`] | [`LegacyChannel`]: connection + channel + declared queue |
//! | AMQP 1.0 (managed bus) | [`ManagedBusConnector`] | [`ManagedLink`]: client + session + sender |

use std::fmt;

use async_trait::async_trait;

use super::BusError;

/// Dials the self-hosted broker
#[async_trait]
pub trait LegacyBusConnector: Send + Sync + fmt::Debug {
    /// Connect, open a channel and declare the durable `queue`
    async fn connect(&self, url: &str, queue: &str) -> Result<Box<dyn LegacyChannel>, BusError>;
}

/// An open channel with its queue declared
#[async_trait]
pub trait LegacyChannel: Send + Sync + fmt::Debug {
    /// Name the broker gave the declared queue
    fn queue_name(&self) -> &str;

    /// Publish a persistent JSON message to the declared queue
    async fn publish(&self, body: &[u8]) -> Result<(), BusError>;

    async fn close(&self) -> Result<(), BusError>;
}

/// Dials the managed bus
#[async_trait]
pub trait ManagedBusConnector: Send + Sync + fmt::Debug {
    /// Build a fresh client, session and sender targeting `entity`
    ///
    /// A dial failure is a [`BusError::Connection`]; failing to open the
    /// session or attach the sender on a dialled client is a
    /// [`BusError::Session`].
    async fn connect(&self, url: &str, entity: &str) -> Result<Box<dyn ManagedLink>, BusError>;
}

/// A client/session/sender triple
#[async_trait]
pub trait ManagedLink: Send + fmt::Debug {
    async fn send(&mut self, body: Vec<u8>) -> Result<(), BusError>;

    /// Detach the sender, end the session and close the client
    async fn close(self: Box<Self>);
}
