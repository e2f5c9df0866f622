//! Bus client implementations.

pub mod in_memory;
pub mod rabbitmq;
pub mod service_bus;

pub use in_memory::{ConnectScript, InMemoryLegacyConnector, InMemoryManagedConnector, SendScript};
pub use rabbitmq::RabbitMqConnector;
pub use service_bus::ServiceBusConnector;
