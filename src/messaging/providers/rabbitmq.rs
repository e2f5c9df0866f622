//! # RabbitMQ Connector
//!
//! AMQP 0.9.1 client for the self-hosted broker, using the `lapin` crate.
//!
//! Messages go to the default exchange with the queue name as routing key,
//! non-mandatory and non-immediate, persistent, with content type
//! `application/json`. The channel runs in confirm mode, so a publish only
//! succeeds once the broker acks it.

use async_trait::async_trait;
use lapin::options::{BasicPublishOptions, ConfirmSelectOptions, QueueDeclareOptions};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};
use tracing::{debug, info};

use crate::constants::{bus, events};
use crate::messaging::traits::{LegacyBusConnector, LegacyChannel};
use crate::messaging::BusError;

#[derive(Debug, Clone, Default)]
pub struct RabbitMqConnector;

impl RabbitMqConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LegacyBusConnector for RabbitMqConnector {
    async fn connect(&self, url: &str, queue: &str) -> Result<Box<dyn LegacyChannel>, BusError> {
        let connection = Connection::connect(
            url,
            ConnectionProperties::default().with_connection_name(events::CLOUD_ROLE.into()),
        )
        .await
        .map_err(|e| BusError::connection(format!("RabbitMQ connection failed: {e}")))?;

        let channel = connection.create_channel().await.map_err(|e| {
            BusError::connection(format!("RabbitMQ channel creation failed: {e}"))
        })?;

        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await
            .map_err(|e| BusError::connection(format!("Enabling publisher confirms failed: {e}")))?;

        let declared = channel
            .queue_declare(
                queue,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| BusError::connection(format!("Queue {queue} declaration failed: {e}")))?;

        info!(queue = %declared.name().as_str(), "Declared RabbitMQ queue");

        Ok(Box::new(RabbitMqChannel {
            queue: declared.name().as_str().to_string(),
            connection,
            channel,
        }))
    }
}

#[derive(Debug)]
pub struct RabbitMqChannel {
    connection: Connection,
    channel: Channel,
    queue: String,
}

#[async_trait]
impl LegacyChannel for RabbitMqChannel {
    fn queue_name(&self) -> &str {
        &self.queue
    }

    async fn publish(&self, body: &[u8]) -> Result<(), BusError> {
        if !self.connection.status().connected() {
            return Err(BusError::send(&self.queue, "RabbitMQ connection is not connected"));
        }

        let confirm = self
            .channel
            .basic_publish(
                "",
                &self.queue,
                BasicPublishOptions::default(),
                body,
                BasicProperties::default()
                    .with_delivery_mode(bus::PERSISTENT_DELIVERY_MODE)
                    .with_content_type(bus::CONTENT_TYPE_JSON.into()),
            )
            .await
            .map_err(|e| BusError::send(&self.queue, format!("Publish failed: {e}")))?;

        let confirmation = confirm
            .await
            .map_err(|e| BusError::send(&self.queue, format!("Publish confirmation failed: {e}")))?;
        if confirmation.is_nack() {
            return Err(BusError::send(&self.queue, "Broker nacked the message"));
        }

        debug!(queue = %self.queue, bytes = body.len(), "Published to RabbitMQ");
        Ok(())
    }

    async fn close(&self) -> Result<(), BusError> {
        self.channel
            .close(200, "OK")
            .await
            .map_err(|e| BusError::connection(format!("Channel close failed: {e}")))?;
        self.connection
            .close(200, "OK")
            .await
            .map_err(|e| BusError::connection(format!("Connection close failed: {e}")))
    }
}
