#![allow(clippy::doc_markdown)] // Allow technical terms like MongoDB, CosmosDB, RabbitMQ in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Order Dispatch
//!
//! Capture core for an order service: persists each order to a document store
//! and announces it on a message bus.
//!
//! ## Overview
//!
//! The same binary runs against two deployments of each backend, chosen at
//! startup from the connection strings:
//!
//! | Backend | Self-hosted | Managed |
//! |---|---|---|
//! | Document store | MongoDB | CosmosDB (MongoDB API) |
//! | Message bus | RabbitMQ, AMQP 0.9.1 | Service Bus, AMQP 1.0 |
//!
//! Storage is authoritative: a failed insert is returned to the caller. The
//! bus is best effort: a failed publish is logged and recorded, never returned.
//!
//! ## Module Organization
//!
//! - [`backend`] - one-time backend classification
//! - [`database`] - partitioned insert, shard bootstrap, bounded session pool
//! - [`messaging`] - legacy and managed publishers behind one dispatcher
//! - [`telemetry`] - events, dependency records and exceptions fanned out to collectors
//! - [`resilience`] - fixed-delay bounded retry
//! - [`pipeline`] - startup wiring and the per-order path
//! - [`config`] - configuration loaded once at startup
//! - [`models`] - the order and its bus envelope
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use order_dispatch::config::PipelineConfig;
//! use order_dispatch::models::Order;
//! use order_dispatch::pipeline::{OrderPipeline, PipelineCollaborators};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! order_dispatch::logging::init_tracing();
//!
//! let config = PipelineConfig::from_env()?;
//! let pipeline = OrderPipeline::bootstrap(config, PipelineCollaborators::default()).await?;
//!
//! let stored = pipeline.capture(&Order::new("buyer@example.com").with_product("socks")).await?;
//! println!("stored order {} in {}", stored.id, stored.partition);
//!
//! pipeline.shutdown().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! Every external client has an in-memory counterpart
//! ([`InMemoryDocumentStore`](database::InMemoryDocumentStore),
//! [`InMemoryLegacyConnector`](messaging::providers::InMemoryLegacyConnector),
//! [`InMemoryManagedConnector`](messaging::providers::InMemoryManagedConnector),
//! [`InMemoryTelemetrySink`](telemetry::InMemoryTelemetrySink)) so the whole
//! pipeline runs without a database, a broker or a collector.

pub mod backend;
pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod logging;
pub mod messaging;
pub mod models;
pub mod pipeline;
pub mod resilience;
pub mod telemetry;

pub use backend::{BackendSelection, BusVariant, StoreVariant};
pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use models::{Order, OrderEnvelope};
pub use pipeline::{OrderPipeline, PipelineCollaborators};
