//! Session storage

use crate::{ChatMessage, ChatSession, SessionError, SessionResult};
use async_trait::async_trait;
use parley_core::Role;
use uuid::Uuid;

mod memory;

pub use memory::MemoryStore;

/// Trait for storing chat sessions and their messages
///
/// Every lookup that takes a `user_id` treats sessions owned by someone else,
/// and soft-deleted sessions, as missing.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a session for `user_id`
    async fn create_session(&self, user_id: &str, title: &str) -> SessionResult<ChatSession>;

    /// Load a session visible to `user_id`
    async fn get_session(&self, id: Uuid, user_id: &str) -> SessionResult<ChatSession>;

    /// Sessions visible to `user_id`, newest first
    async fn list_sessions(&self, user_id: &str) -> SessionResult<Vec<ChatSession>>;

    /// Change the title of a session
    async fn rename_session(
        &self,
        id: Uuid,
        user_id: &str,
        title: &str,
    ) -> SessionResult<ChatSession>;

    /// Soft-delete a session; its messages are kept
    async fn delete_session(&self, id: Uuid, user_id: &str) -> SessionResult<()>;

    /// Persist a message at the end of a session
    async fn append_message(
        &self,
        session_id: Uuid,
        role: Role,
        content: &str,
    ) -> SessionResult<ChatMessage>;

    /// Messages of a session in chronological order
    async fn messages(&self, session_id: Uuid) -> SessionResult<Vec<ChatMessage>>;

    /// Check if a session is visible to `user_id`
    async fn exists(&self, id: Uuid, user_id: &str) -> SessionResult<bool> {
        match self.get_session(id, user_id).await {
            Ok(_) => Ok(true),
            Err(SessionError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
