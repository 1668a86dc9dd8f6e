//! Error types for session operations

use thiserror::Error;
use uuid::Uuid;

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors that can occur while serving a chat session
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    /// Session does not exist, belongs to another user or was deleted
    #[error("Chat session not found: {0}")]
    NotFound(Uuid),

    /// Provider dispatch failed or was cancelled
    #[error(transparent)]
    Dispatch(#[from] parley_core::Error),

    /// Storage backend error
    #[error("Storage error: {0}")]
    Storage(String),
}

impl SessionError {
    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Whether the consumer went away before the reply finished
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SessionError::Dispatch(parley_core::Error::Cancelled))
    }
}
