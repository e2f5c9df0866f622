//! Error types for the order dispatch pipeline.
//!
//! Each concern owns a structured error (`StoreError`, `BusError`, `ConfigError`,
//! `BackendError`); `PipelineError` aggregates them and carries the fatal vs
//! operational classification used at startup.

use thiserror::Error;

use crate::backend::BackendError;
use crate::config::ConfigError;
use crate::database::StoreError;
use crate::messaging::BusError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Backend selection error: {0}")]
    Backend(#[from] BackendError),

    #[error("Document store error: {0}")]
    Store(#[from] StoreError),

    #[error("Message bus error: {0}")]
    Bus(#[from] BusError),
}

impl PipelineError {
    /// Whether this error must stop the process before it serves any order
    ///
    /// Malformed connection strings, an unestablishable store session and a
    /// managed-bus session that cannot be opened are fatal. Everything else is
    /// operational and only surfaces through logs and telemetry.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Configuration(_) | Self::Backend(_) => true,
            Self::Store(e) => e.is_session_failure(),
            Self::Bus(e) => e.is_session_failure(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
