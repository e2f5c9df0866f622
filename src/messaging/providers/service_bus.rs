//! # Service Bus Connector
//!
//! AMQP 1.0 client for the managed cloud bus, using `fe2o3-amqp`.
//!
//! Each [`ServiceBusConnector::connect`] builds a complete client, session and
//! sender. Credentials come from the URL user-info (SASL PLAIN) and `amqps`
//! URLs are dialled over TLS.

use std::fmt;

use async_trait::async_trait;
use fe2o3_amqp::connection::ConnectionHandle;
use fe2o3_amqp::session::SessionHandle;
use fe2o3_amqp::types::messaging::Message;
use fe2o3_amqp::types::primitives::Binary;
use fe2o3_amqp::{Connection, Sender, Session};
use tracing::{debug, info};
use uuid::Uuid;

use crate::backend::redact_url;
use crate::constants::events;
use crate::messaging::traits::{ManagedBusConnector, ManagedLink};
use crate::messaging::BusError;

#[derive(Debug, Clone, Default)]
pub struct ServiceBusConnector;

impl ServiceBusConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ManagedBusConnector for ServiceBusConnector {
    async fn connect(&self, url: &str, entity: &str) -> Result<Box<dyn ManagedLink>, BusError> {
        let container_id = format!("{}-{}", events::CLOUD_ROLE, Uuid::new_v4());

        debug!(url = %redact_url(url), entity, "Attempting to connect to ServiceBus");
        let mut connection = Connection::open(container_id, url)
            .await
            .map_err(|e| BusError::connection(format!("ServiceBus connection failed: {e}")))?;

        let mut session = match Session::begin(&mut connection).await {
            Ok(session) => session,
            Err(e) => {
                let _ = connection.close().await;
                return Err(BusError::session(format!("Creating AMQP session failed: {e}")));
            }
        };

        let link_name = format!("order-sender-{}", Uuid::new_v4());
        let sender = match Sender::attach(&mut session, link_name, entity).await {
            Ok(sender) => sender,
            Err(e) => {
                let _ = session.end().await;
                let _ = connection.close().await;
                return Err(BusError::session(format!("Creating sender link failed: {e}")));
            }
        };

        info!(entity, "Connected to ServiceBus");
        Ok(Box::new(ServiceBusLink {
            entity: entity.to_string(),
            connection,
            session,
            sender,
        }))
    }
}

pub struct ServiceBusLink {
    entity: String,
    connection: ConnectionHandle<()>,
    session: SessionHandle<()>,
    sender: Sender,
}

impl fmt::Debug for ServiceBusLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceBusLink")
            .field("entity", &self.entity)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ManagedLink for ServiceBusLink {
    async fn send(&mut self, body: Vec<u8>) -> Result<(), BusError> {
        let message = Message::builder().data(Binary::from(body)).build();

        let outcome = self
            .sender
            .send(message)
            .await
            .map_err(|e| BusError::send(&self.entity, e.to_string()))?;

        outcome
            .accepted_or_else(|outcome| format!("Message not accepted: {outcome:?}"))
            .map_err(|message| BusError::send(&self.entity, message))?;

        Ok(())
    }

    async fn close(self: Box<Self>) {
        let ServiceBusLink {
            entity,
            mut connection,
            mut session,
            sender,
        } = *self;

        if let Err(e) = sender.close().await {
            debug!(entity = %entity, error = %e, "Sender close failed");
        }
        if let Err(e) = session.end().await {
            debug!(entity = %entity, error = %e, "Session end failed");
        }
        if let Err(e) = connection.close().await {
            debug!(entity = %entity, error = %e, "Connection close failed");
        }
    }
}
