//! # In-Memory Bus Connectors
//!
//! Scripted stand-ins for both bus protocols. Each connector shares its
//! counters with every channel or link it hands out, so a test can inspect
//! dials, send attempts and teardowns after driving a publisher.
//!
//! Unscripted operations succeed.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::messaging::traits::{LegacyBusConnector, LegacyChannel, ManagedBusConnector, ManagedLink};
use crate::messaging::BusError;
use crate::models::OrderEnvelope;

#[derive(Debug, Default)]
struct LegacyState {
    dials: AtomicUsize,
    failing_dials: AtomicUsize,
    fail_publish: AtomicBool,
    published: Mutex<Vec<Vec<u8>>>,
    closed: AtomicBool,
}

/// Self-hosted broker fake
#[derive(Debug, Clone, Default)]
pub struct InMemoryLegacyConnector {
    state: Arc<LegacyState>,
}

impl InMemoryLegacyConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// The first `count` dials fail
    pub fn with_failing_dials(self, count: usize) -> Self {
        self.state.failing_dials.store(count, Ordering::SeqCst);
        self
    }

    /// Every dial fails
    pub fn unreachable() -> Self {
        Self::new().with_failing_dials(usize::MAX)
    }

    pub fn set_fail_publish(&self, fail: bool) {
        self.state.fail_publish.store(fail, Ordering::SeqCst);
    }

    pub fn dial_count(&self) -> usize {
        self.state.dials.load(Ordering::SeqCst)
    }

    pub fn published(&self) -> Vec<Vec<u8>> {
        self.state.published.lock().clone()
    }

    /// Published bodies parsed back into envelopes
    pub fn published_envelopes(&self) -> Vec<OrderEnvelope> {
        self.published()
            .iter()
            .filter_map(|body| OrderEnvelope::from_bytes(body).ok())
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LegacyBusConnector for InMemoryLegacyConnector {
    async fn connect(&self, _url: &str, queue: &str) -> Result<Box<dyn LegacyChannel>, BusError> {
        self.state.dials.fetch_add(1, Ordering::SeqCst);

        let remaining = self.state.failing_dials.load(Ordering::SeqCst);
        if remaining > 0 {
            if remaining != usize::MAX {
                self.state.failing_dials.fetch_sub(1, Ordering::SeqCst);
            }
            return Err(BusError::connection("connection refused"));
        }

        Ok(Box::new(InMemoryLegacyChannel {
            queue: queue.to_string(),
            state: Arc::clone(&self.state),
        }))
    }
}

#[derive(Debug)]
struct InMemoryLegacyChannel {
    queue: String,
    state: Arc<LegacyState>,
}

#[async_trait]
impl LegacyChannel for InMemoryLegacyChannel {
    fn queue_name(&self) -> &str {
        &self.queue
    }

    async fn publish(&self, body: &[u8]) -> Result<(), BusError> {
        if self.state.fail_publish.load(Ordering::SeqCst) {
            return Err(BusError::send(&self.queue, "channel closed"));
        }
        self.state.published.lock().push(body.to_vec());
        Ok(())
    }

    async fn close(&self) -> Result<(), BusError> {
        self.state.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Outcome of one managed connect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectScript {
    Connect,
    FailDial,
    FailSession,
}

/// Outcome of one managed send attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendScript {
    Accept,
    /// The link reports a detached sender
    Reject,
    /// The send never completes
    Hang,
}

#[derive(Debug, Default)]
struct ManagedState {
    connect_script: Mutex<VecDeque<ConnectScript>>,
    send_script: Mutex<VecDeque<SendScript>>,
    connects: AtomicUsize,
    send_attempts: AtomicUsize,
    teardowns: AtomicUsize,
    sent: Mutex<Vec<Vec<u8>>>,
}

/// Managed bus fake
#[derive(Debug, Clone, Default)]
pub struct InMemoryManagedConnector {
    state: Arc<ManagedState>,
}

impl InMemoryManagedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outcomes for the next connects, in order
    pub fn with_connects(self, script: impl IntoIterator<Item = ConnectScript>) -> Self {
        self.state.connect_script.lock().extend(script);
        self
    }

    /// Outcomes for the next send attempts, in order
    pub fn with_sends(self, script: impl IntoIterator<Item = SendScript>) -> Self {
        self.state.send_script.lock().extend(script);
        self
    }

    pub fn connect_count(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    pub fn send_attempts(&self) -> usize {
        self.state.send_attempts.load(Ordering::SeqCst)
    }

    /// Links closed so far
    pub fn teardown_count(&self) -> usize {
        self.state.teardowns.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.state.sent.lock().clone()
    }

    pub fn sent_envelopes(&self) -> Vec<OrderEnvelope> {
        self.sent()
            .iter()
            .filter_map(|body| OrderEnvelope::from_bytes(body).ok())
            .collect()
    }
}

#[async_trait]
impl ManagedBusConnector for InMemoryManagedConnector {
    async fn connect(&self, _url: &str, entity: &str) -> Result<Box<dyn ManagedLink>, BusError> {
        self.state.connects.fetch_add(1, Ordering::SeqCst);

        let next = self
            .state
            .connect_script
            .lock()
            .pop_front()
            .unwrap_or(ConnectScript::Connect);

        match next {
            ConnectScript::Connect => Ok(Box::new(InMemoryManagedLink {
                entity: entity.to_string(),
                state: Arc::clone(&self.state),
            })),
            ConnectScript::FailDial => Err(BusError::connection("dial tcp: connection refused")),
            ConnectScript::FailSession => Err(BusError::session("session begin rejected")),
        }
    }
}

#[derive(Debug)]
struct InMemoryManagedLink {
    entity: String,
    state: Arc<ManagedState>,
}

#[async_trait]
impl ManagedLink for InMemoryManagedLink {
    async fn send(&mut self, body: Vec<u8>) -> Result<(), BusError> {
        self.state.send_attempts.fetch_add(1, Ordering::SeqCst);

        let next = self
            .state
            .send_script
            .lock()
            .pop_front()
            .unwrap_or(SendScript::Accept);

        match next {
            SendScript::Accept => {
                self.state.sent.lock().push(body);
                Ok(())
            }
            SendScript::Reject => Err(BusError::send(&self.entity, "link detached")),
            SendScript::Hang => {
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }

    async fn close(self: Box<Self>) {
        self.state.teardowns.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_legacy_dial_failures_run_out() {
        let connector = InMemoryLegacyConnector::new().with_failing_dials(1);

        assert!(connector.connect("amqp://x", "order").await.is_err());
        assert!(connector.connect("amqp://x", "order").await.is_ok());
        assert_eq!(connector.dial_count(), 2);
    }

    #[tokio::test]
    async fn test_managed_script_is_consumed_in_order() {
        let connector = InMemoryManagedConnector::new()
            .with_connects([ConnectScript::FailDial])
            .with_sends([SendScript::Reject]);

        assert!(connector.connect("amqps://x", "orders").await.is_err());
        let mut link = connector.connect("amqps://x", "orders").await.unwrap();

        assert!(link.send(b"one".to_vec()).await.is_err());
        assert!(link.send(b"two".to_vec()).await.is_ok());
        link.close().await;

        assert_eq!(connector.send_attempts(), 2);
        assert_eq!(connector.sent(), vec![b"two".to_vec()]);
        assert_eq!(connector.teardown_count(), 1);
    }
}
