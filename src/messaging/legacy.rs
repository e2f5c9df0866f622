//! # Legacy Bus Publisher
//!
//! Publishes order envelopes to the self-hosted broker over AMQP 0.9.1.
//!
//! The connection is established once at startup through the retry policy.
//! When every attempt fails the publisher stays unestablished for the life of
//! the process and each publish is a logged no-op. There is no background
//! reconnection, and a failed publish is not retried.

use std::sync::Arc;

use opentelemetry::KeyValue;
use tracing::{error, info, warn};

use super::traits::{LegacyBusConnector, LegacyChannel};
use crate::backend::{redact_url, BusVariant};
use crate::config::PipelineConfig;
use crate::constants::{bus, dependencies, events};
use crate::models::Order;
use crate::resilience::AttemptError;
use crate::telemetry::{metrics, BusinessEvent, DependencyCall, TelemetryRecorder};

const VARIANT: BusVariant = BusVariant::SelfHosted;

#[derive(Debug)]
pub struct LegacyBusPublisher {
    channel: Option<Box<dyn LegacyChannel>>,
    target: String,
    team_name: String,
    telemetry: TelemetryRecorder,
}

impl LegacyBusPublisher {
    /// Dial the broker and declare the order queue
    ///
    /// Never fails: if the retry policy gives up the publisher is returned
    /// unestablished.
    pub async fn establish(
        connector: Arc<dyn LegacyBusConnector>,
        config: &PipelineConfig,
        telemetry: TelemetryRecorder,
    ) -> Self {
        let url = config.bus_url.as_str();
        let recorder = &telemetry;
        let connector = connector.as_ref();

        let result = config
            .retry
            .run("rabbitmq_connect", |attempt| async move {
                info!(attempt, url = %redact_url(url), "Attempting to connect to RabbitMQ");
                connector
                    .connect(url, bus::LEGACY_QUEUE_NAME)
                    .await
                    .map_err(|e| {
                        recorder.track_exception(&e);
                        AttemptError::Retryable(e)
                    })
            })
            .await;

        let channel = match result {
            Ok(channel) => {
                info!(queue = %channel.queue_name(), "Connected to RabbitMQ");
                Some(channel)
            }
            Err(e) => {
                warn!(
                    attempts = config.retry.max_attempts(),
                    error = %e,
                    "Couldn't connect to RabbitMQ, orders will not be published"
                );
                None
            }
        };

        Self {
            channel,
            target: redact_url(&config.bus_url),
            team_name: config.team_name.clone(),
            telemetry,
        }
    }

    pub fn is_established(&self) -> bool {
        self.channel.is_some()
    }

    /// Publish the order's envelope; failures are only logged and recorded
    ///
    /// Orders without an id and partition are never put on the wire.
    pub async fn publish(&self, order: &Order) {
        if !order.is_persisted() {
            warn!(email = %order.email, "Refusing to publish an order that has not been stored");
            return;
        }

        let Some(channel) = &self.channel else {
            info!(order_id = %order.id, "Skipping AMQP. It is either not configured or improperly configured");
            return;
        };

        let body = match order.envelope(&self.team_name).to_bytes() {
            Ok(body) => body,
            Err(e) => {
                self.telemetry.track_exception(&e);
                error!(order_id = %order.id, error = %e, "Failed to serialize order envelope");
                return;
            }
        };

        let call = DependencyCall::new(
            VARIANT.name(),
            dependencies::BUS_KIND,
            self.target.clone(),
            dependencies::SEND_MESSAGE,
        );
        let labels = [KeyValue::new("backend", VARIANT.name())];

        match self.telemetry.observe(&call, channel.publish(&body)).await {
            Ok(()) => {
                self.telemetry.track_event(&BusinessEvent::order_step(
                    format!("SendOrder to {VARIANT}"),
                    &self.team_name,
                    events::SEQUENCE_PUBLISHED,
                    VARIANT.event_type(),
                    &order.id,
                ));
                metrics::messages_published_total().add(1, &labels);
                info!(order_id = %order.id, queue = %channel.queue_name(), "Sent to AMQP 0.9.1 (RabbitMQ)");
            }
            Err(e) => {
                metrics::message_publish_failures_total().add(1, &labels);
                error!(order_id = %order.id, queue = %channel.queue_name(), error = %e, "Sending message failed");
            }
        }
    }

    pub async fn close(&self) {
        if let Some(channel) = &self.channel {
            if let Err(e) = channel.close().await {
                warn!(error = %e, "Failed to close RabbitMQ connection");
            }
        }
    }
}
