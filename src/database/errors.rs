//! # Document Store Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store session error: {message}")]
    Session { message: String },

    #[error("Insert into {collection} failed: {message}")]
    Insert { collection: String, message: String },

    #[error("Store command {command} failed: {message}")]
    Command { command: String, message: String },

    #[error("Store session pool is closed")]
    PoolClosed,
}

impl StoreError {
    /// Create a session establishment error
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session {
            message: message.into(),
        }
    }

    /// Create an insert error
    pub fn insert(collection: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Insert {
            collection: collection.into(),
            message: message.into(),
        }
    }

    /// Create an admin command error
    pub fn command(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Command {
            command: command.into(),
            message: message.into(),
        }
    }

    /// The store session could not be established at all
    pub fn is_session_failure(&self) -> bool {
        matches!(self, Self::Session { .. })
    }
}
