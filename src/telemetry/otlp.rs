//! # OTLP Telemetry Collector
//!
//! Ships telemetry to an OpenTelemetry collector, one tracer provider per
//! collector key. The key travels as the `telemetry.collector.key` resource
//! attribute so the collector can route it to the right backend.
//!
//! | Record | Exported as |
//! |---|---|
//! | Business event | zero-duration internal span named after the event, properties as attributes |
//! | Dependency | client span with the recorded start/end and an error status on failure |
//! | Exception | internal span carrying an `exception` event |

use std::fmt;
use std::time::SystemTime;

use opentelemetry::trace::{Span, SpanKind, Status, Tracer, TracerProvider as _};
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::{SdkTracer, SdkTracerProvider};
use opentelemetry_sdk::Resource;
use tracing::{debug, warn};

use super::recorder::TelemetrySink;
use super::types::{BusinessEvent, DependencyRecord};
use crate::constants::events;

pub struct OtlpTelemetrySink {
    name: String,
    provider: SdkTracerProvider,
    tracer: SdkTracer,
}

impl fmt::Debug for OtlpTelemetrySink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OtlpTelemetrySink")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl OtlpTelemetrySink {
    /// Build a collector for `key`, exporting to `endpoint`
    ///
    /// Must be called from within a Tokio runtime; the batch exporter runs on it.
    pub fn new(
        name: impl Into<String>,
        key: &str,
        endpoint: &str,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let name = name.into();

        let resource = Resource::builder()
            .with_service_name(events::CLOUD_ROLE)
            .with_attributes([
                KeyValue::new("telemetry.collector", name.clone()),
                KeyValue::new("telemetry.collector.key", key.to_string()),
                KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
            ])
            .build();

        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint.to_string())
            .build()?;

        let provider = SdkTracerProvider::builder()
            .with_batch_exporter(exporter)
            .with_resource(resource)
            .build();
        let tracer = provider.tracer("order-dispatch");

        debug!(collector = %name, endpoint = %endpoint, "OTLP telemetry collector created");

        Ok(Self {
            name,
            provider,
            tracer,
        })
    }
}

impl TelemetrySink for OtlpTelemetrySink {
    fn name(&self) -> &str {
        &self.name
    }

    fn track_event(&self, event: &BusinessEvent) {
        let attributes: Vec<KeyValue> = event
            .properties
            .iter()
            .map(|(k, v)| KeyValue::new(k.clone(), v.clone()))
            .collect();

        let mut span = self
            .tracer
            .span_builder(event.name.clone())
            .with_kind(SpanKind::Internal)
            .with_attributes(attributes)
            .start(&self.tracer);
        span.end();
    }

    fn track_dependency(&self, dependency: &DependencyRecord) {
        let mut span = self
            .tracer
            .span_builder(dependency.name.clone())
            .with_kind(SpanKind::Client)
            .with_start_time(SystemTime::from(dependency.started_at))
            .with_attributes(vec![
                KeyValue::new("dependency.type", dependency.kind.clone()),
                KeyValue::new("dependency.target", dependency.target.clone()),
                KeyValue::new("dependency.data", dependency.data.clone()),
                KeyValue::new("dependency.success", dependency.success),
            ])
            .start(&self.tracer);

        match &dependency.result_code {
            Some(code) if !dependency.success => span.set_status(Status::error(code.clone())),
            _ => span.set_status(Status::Ok),
        }
        span.end_with_timestamp(SystemTime::from(dependency.ended_at));
    }

    fn track_exception(&self, message: &str) {
        let mut span = self
            .tracer
            .span_builder("exception")
            .with_kind(SpanKind::Internal)
            .start(&self.tracer);
        span.add_event(
            "exception",
            vec![KeyValue::new("exception.message", message.to_string())],
        );
        span.set_status(Status::error(message.to_string()));
        span.end();
    }

    fn flush(&self) {
        if let Err(e) = self.provider.force_flush() {
            warn!(collector = %self.name, error = %e, "Failed to flush telemetry");
        }
    }
}
