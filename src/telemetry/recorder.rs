//! # Telemetry Recorder
//!
//! Fans business events, dependency records and exceptions out to zero or
//! more collectors. Recording never fails: an empty sink list makes every call
//! a no-op, and sinks swallow their own transport errors.

use std::fmt::{self, Display};
use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use opentelemetry::KeyValue;
use tracing::{debug, warn};

use super::metrics;
use super::otlp::OtlpTelemetrySink;
use super::types::{BusinessEvent, DependencyCall, DependencyRecord};
use crate::config::PipelineConfig;

/// A telemetry collector
pub trait TelemetrySink: Send + Sync + fmt::Debug {
    /// Collector name for logging
    fn name(&self) -> &str;

    fn track_event(&self, event: &BusinessEvent);

    fn track_dependency(&self, dependency: &DependencyRecord);

    fn track_exception(&self, message: &str);

    /// Push buffered telemetry to the collector
    fn flush(&self) {}
}

#[derive(Debug, Clone, Default)]
pub struct TelemetryRecorder {
    sinks: Arc<Vec<Arc<dyn TelemetrySink>>>,
}

impl TelemetryRecorder {
    pub fn new(sinks: Vec<Arc<dyn TelemetrySink>>) -> Self {
        Self {
            sinks: Arc::new(sinks),
        }
    }

    /// Recorder with no collectors
    pub fn disabled() -> Self {
        Self::default()
    }

    /// One OTLP collector per configured key
    ///
    /// The challenge collector is mandatory but a missing key only warns; a
    /// collector that fails to build is skipped.
    pub fn from_config(config: &PipelineConfig) -> Self {
        let mut sinks: Vec<Arc<dyn TelemetrySink>> = Vec::new();

        let collectors = [
            ("challenge", config.challenge_insights_key.as_deref()),
            ("custom", config.custom_insights_key.as_deref()),
        ];
        for (name, key) in collectors {
            let Some(key) = key else {
                if name == "challenge" {
                    warn!("No challenge telemetry key configured, events will not be collected");
                }
                continue;
            };
            match OtlpTelemetrySink::new(name, key, &config.otlp_endpoint) {
                Ok(sink) => sinks.push(Arc::new(sink)),
                Err(e) => warn!(collector = name, error = %e, "Failed to create telemetry collector"),
            }
        }

        debug!(collectors = sinks.len(), "Telemetry recorder created");
        Self::new(sinks)
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    pub fn track_event(&self, event: &BusinessEvent) {
        debug!(event = %event.name, properties = ?event.properties, "Tracking event");
        for sink in self.sinks.iter() {
            sink.track_event(event);
        }
    }

    pub fn track_dependency(&self, dependency: &DependencyRecord) {
        metrics::dependency_duration().record(
            dependency.duration().as_secs_f64() * 1000.0,
            &[
                KeyValue::new("dependency", dependency.name.clone()),
                KeyValue::new("operation", dependency.data.clone()),
                KeyValue::new("success", dependency.success),
            ],
        );
        for sink in self.sinks.iter() {
            sink.track_dependency(dependency);
        }
    }

    pub fn track_exception(&self, error: &dyn Display) {
        let message = error.to_string();
        warn!(error = %message, "Tracking exception");
        for sink in self.sinks.iter() {
            sink.track_exception(&message);
        }
    }

    /// Time a remote call and record it as a dependency
    ///
    /// A failed call is also recorded as an exception. The call's own result
    /// is returned untouched.
    pub async fn observe<T, E, Fut>(&self, call: &DependencyCall, operation: Fut) -> Result<T, E>
    where
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let started_at = Utc::now();
        let result = operation.await;
        let ended_at = Utc::now();

        let error = result.as_ref().err().map(|e| e.to_string());
        if let Some(message) = &error {
            self.track_exception(message);
        }
        self.track_dependency(&call.finish(started_at, ended_at, error));

        result
    }

    /// Flush every collector
    pub fn flush(&self) {
        for sink in self.sinks.iter() {
            debug!(sink = sink.name(), "Flushing telemetry");
            sink.flush();
        }
    }

    /// Flush before the process exits
    pub fn shutdown(&self) {
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::InMemoryTelemetrySink;

    fn recorder_with_two_sinks() -> (TelemetryRecorder, Arc<InMemoryTelemetrySink>, Arc<InMemoryTelemetrySink>) {
        let challenge = Arc::new(InMemoryTelemetrySink::new("challenge"));
        let custom = Arc::new(InMemoryTelemetrySink::new("custom"));
        let recorder = TelemetryRecorder::new(vec![challenge.clone(), custom.clone()]);
        (recorder, challenge, custom)
    }

    #[test]
    fn test_events_are_mirrored_to_every_sink() {
        let (recorder, challenge, custom) = recorder_with_two_sinks();

        recorder.track_event(&BusinessEvent::new("Initial order"));

        assert_eq!(challenge.events().len(), 1);
        assert_eq!(custom.events().len(), 1);
        assert_eq!(custom.events()[0].name, "Initial order");
    }

    #[test]
    fn test_no_keys_means_no_collectors() {
        let recorder = TelemetryRecorder::from_config(&PipelineConfig::default());
        assert_eq!(recorder.sink_count(), 0);
    }

    #[test]
    fn test_disabled_recorder_is_a_no_op() {
        let recorder = TelemetryRecorder::disabled();
        assert_eq!(recorder.sink_count(), 0);

        recorder.track_event(&BusinessEvent::new("ignored"));
        recorder.track_exception(&"ignored");
        recorder.flush();
    }

    #[tokio::test]
    async fn test_observe_records_success() {
        let (recorder, challenge, _) = recorder_with_two_sinks();
        let call = DependencyCall::new("MongoDB", "MongoDB", "mongodb://mongo", "Insert order");

        let value: Result<u32, String> = recorder.observe(&call, async { Ok(7) }).await;

        assert_eq!(value.unwrap(), 7);
        let dependencies = challenge.dependencies();
        assert_eq!(dependencies.len(), 1);
        assert!(dependencies[0].success);
        assert_eq!(dependencies[0].data, "Insert order");
        assert!(challenge.exceptions().is_empty());
    }

    #[tokio::test]
    async fn test_observe_records_failure_as_exception_and_dependency() {
        let (recorder, challenge, custom) = recorder_with_two_sinks();
        let call = DependencyCall::new("RabbitMQ", "AMQP", "amqp://rabbitmq", "Send message");

        let value: Result<(), String> = recorder
            .observe(&call, async { Err("channel closed".to_string()) })
            .await;

        assert!(value.is_err());
        for sink in [challenge, custom] {
            let dependencies = sink.dependencies();
            assert_eq!(dependencies.len(), 1);
            assert!(!dependencies[0].success);
            assert_eq!(dependencies[0].result_code.as_deref(), Some("channel closed"));
            assert_eq!(sink.exceptions(), vec!["channel closed".to_string()]);
        }
    }
}
