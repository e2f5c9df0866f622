//! # Store Session Pool
//!
//! Bounds the number of in-flight store operations per process. Managed
//! document stores throttle on concurrent sockets, so the limit is a hard cap:
//! callers past it wait in [`SessionPool::acquire`] instead of opening more
//! connections.
//!
//! Characteristics:
//! - FIFO fairness, inherited from `tokio::sync::Semaphore`
//! - A [`SessionHandle`] is released when dropped, including on early return
//!   or error
//! - Handles are cheap: they share the driver client, they do not own a socket

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, trace};

use super::store::DocumentStore;
use super::StoreError;

#[derive(Debug, Clone)]
pub struct SessionPool {
    store: Arc<dyn DocumentStore>,
    permits: Arc<Semaphore>,
    limit: usize,
}

impl SessionPool {
    pub fn new(store: Arc<dyn DocumentStore>, limit: usize) -> Self {
        let limit = limit.max(1);
        debug!(limit, provider = store.provider_name(), "Store session pool created");
        Self {
            store,
            permits: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    /// Borrow a session, waiting while the pool is saturated
    pub async fn acquire(&self) -> Result<SessionHandle, StoreError> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| StoreError::PoolClosed)?;

        trace!(available = self.available(), "Store session acquired");
        Ok(SessionHandle {
            store: Arc::clone(&self.store),
            _permit: permit,
        })
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Sessions that can be borrowed without waiting
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Refuse further borrows, then shut the store client down
    ///
    /// Waiters fail with [`StoreError::PoolClosed`].
    pub async fn close(&self) {
        self.permits.close();
        self.store.close().await;
    }
}

/// A borrowed store session, returned to the pool on drop
#[derive(Debug)]
pub struct SessionHandle {
    store: Arc<dyn DocumentStore>,
    _permit: OwnedSemaphorePermit,
}

impl std::ops::Deref for SessionHandle {
    type Target = dyn DocumentStore;

    fn deref(&self) -> &Self::Target {
        self.store.as_ref()
    }
}
