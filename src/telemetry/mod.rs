//! # Telemetry
//!
//! Every remote call (store insert, bus publish, startup connection) is
//! wrapped with business events, dependency records and exceptions sent to a
//! mandatory collector and, when configured, mirrored to a second one.
//!
//! ## Architecture
//!
//! ```text
//! TelemetryRecorder               <- fan-out, never fails
//!   └── Vec<Arc<dyn TelemetrySink>>
//!         ├── OtlpTelemetrySink   <- one tracer provider per collector key
//!         └── InMemoryTelemetrySink
//! ```
//!
//! Metrics go through the global OpenTelemetry meter, see [`metrics`].

pub mod in_memory;
pub mod metrics;
pub mod otlp;
mod recorder;
mod types;

pub use in_memory::InMemoryTelemetrySink;
pub use otlp::OtlpTelemetrySink;
pub use recorder::{TelemetryRecorder, TelemetrySink};
pub use types::{BusinessEvent, DependencyCall, DependencyRecord};
