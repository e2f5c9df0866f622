//! # Messaging
//!
//! Announces stored orders on the message bus. Two protocols are supported
//! and exactly one is active per process:
//!
//! | Bus | Protocol | Publisher | Failure handling |
//! |---|---|---|---|
//! | Self-hosted broker | AMQP 0.9.1 | [`LegacyBusPublisher`] | no per-message retry, no reconnection |
//! | Managed cloud bus | AMQP 1.0 | [`ManagedBusPublisher`] | retry with full link rebuild between attempts |
//!
//! [`MessageDispatcher`] picks one from the startup
//! [`BackendSelection`](crate::backend::BackendSelection).
//!
//! ## Wire payload
//!
//! Both protocols carry the same UTF-8 JSON body:
//!
//! ```json
//! {"order": "<order id>", "source": "<team name>"}
//! ```

pub mod dispatcher;
pub mod errors;
pub mod legacy;
pub mod link;
pub mod managed;
pub mod providers;
pub mod traits;

pub use dispatcher::{BusConnectors, MessageDispatcher};
pub use errors::BusError;
pub use legacy::LegacyBusPublisher;
pub use link::{transition, LinkEvent, LinkPhase, ManagedLinkMachine};
pub use managed::ManagedBusPublisher;
pub use traits::{LegacyBusConnector, LegacyChannel, ManagedBusConnector, ManagedLink};
