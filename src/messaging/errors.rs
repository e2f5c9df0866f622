//! # Message Bus Error Types
//!
//! Structured errors for both bus protocols, with constructor helpers so call
//! sites read `BusError::send(queue, e.to_string())`.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    #[error("Bus connection error: {message}")]
    Connection { message: String },

    #[error("Bus session error: {message}")]
    Session { message: String },

    #[error("Send to {queue} failed: {message}")]
    Send { queue: String, message: String },

    #[error("Operation {operation} timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("Message serialization error: {message}")]
    Serialization { message: String },

    #[error("Bus link is not established")]
    NotEstablished,

    #[error("Invalid link transition from {from} on {event}")]
    InvalidTransition { from: String, event: String },
}

impl BusError {
    /// Create a dial/connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a session/link establishment error
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session {
            message: message.into(),
        }
    }

    /// Create a send error
    pub fn send(queue: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Send {
            queue: queue.into(),
            message: message.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// A session could not be opened on an established connection
    pub fn is_session_failure(&self) -> bool {
        matches!(self, Self::Session { .. })
    }
}

impl From<serde_json::Error> for BusError {
    fn from(error: serde_json::Error) -> Self {
        Self::serialization(error.to_string())
    }
}
