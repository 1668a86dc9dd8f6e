//! In-memory session storage

use crate::{ChatMessage, ChatSession, SessionError, SessionResult, SessionStore};
use async_trait::async_trait;
use parley_core::Role;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, trace};
use uuid::Uuid;

#[derive(Debug, Default)]
struct Tables {
    /// Creation order
    sessions: Vec<ChatSession>,
    messages: HashMap<Uuid, Vec<ChatMessage>>,
}

impl Tables {
    fn visible_mut(&mut self, id: Uuid, user_id: &str) -> SessionResult<&mut ChatSession> {
        self.sessions
            .iter_mut()
            .find(|s| s.id == id && s.is_visible_to(user_id))
            .ok_or(SessionError::NotFound(id))
    }
}

/// In-memory session store
///
/// Suitable for development, tests and the command line client. Data is
/// lost when the process stops. Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    /// Create a new empty memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions, deleted ones included
    pub async fn len(&self) -> usize {
        self.tables.read().await.sessions.len()
    }

    /// Check if the store holds no sessions
    pub async fn is_empty(&self) -> bool {
        self.tables.read().await.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create_session(&self, user_id: &str, title: &str) -> SessionResult<ChatSession> {
        let session = ChatSession::new(user_id, title);
        let mut tables = self.tables.write().await;
        tables.sessions.push(session.clone());
        tables.messages.insert(session.id, Vec::new());
        debug!(session_id = %session.id, user_id, "Created chat session");
        Ok(session)
    }

    async fn get_session(&self, id: Uuid, user_id: &str) -> SessionResult<ChatSession> {
        trace!(session_id = %id, user_id, "Loading chat session");
        let tables = self.tables.read().await;
        tables
            .sessions
            .iter()
            .find(|s| s.id == id && s.is_visible_to(user_id))
            .cloned()
            .ok_or(SessionError::NotFound(id))
    }

    async fn list_sessions(&self, user_id: &str) -> SessionResult<Vec<ChatSession>> {
        let tables = self.tables.read().await;
        let mut sessions: Vec<_> = tables
            .sessions
            .iter()
            .rev()
            .filter(|s| s.is_visible_to(user_id))
            .cloned()
            .collect();
        // stable, so equal timestamps keep newest-created first
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        trace!(user_id, count = sessions.len(), "Listed chat sessions");
        Ok(sessions)
    }

    async fn rename_session(
        &self,
        id: Uuid,
        user_id: &str,
        title: &str,
    ) -> SessionResult<ChatSession> {
        let mut tables = self.tables.write().await;
        let session = tables.visible_mut(id, user_id)?;
        session.title = title.to_string();
        debug!(session_id = %id, "Renamed chat session");
        Ok(session.clone())
    }

    async fn delete_session(&self, id: Uuid, user_id: &str) -> SessionResult<()> {
        let mut tables = self.tables.write().await;
        tables.visible_mut(id, user_id)?.is_deleted = true;
        debug!(session_id = %id, "Deleted chat session");
        Ok(())
    }

    async fn append_message(
        &self,
        session_id: Uuid,
        role: Role,
        content: &str,
    ) -> SessionResult<ChatMessage> {
        let message = ChatMessage::new(session_id, role, content);
        let mut tables = self.tables.write().await;
        tables
            .messages
            .get_mut(&session_id)
            .ok_or(SessionError::NotFound(session_id))?
            .push(message.clone());
        trace!(session_id = %session_id, message_id = %message.id, %role, "Appended message");
        Ok(message)
    }

    async fn messages(&self, session_id: Uuid) -> SessionResult<Vec<ChatMessage>> {
        let tables = self.tables.read().await;
        tables
            .messages
            .get(&session_id)
            .cloned()
            .ok_or(SessionError::NotFound(session_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_session_lifecycle() {
        let store = MemoryStore::new();
        assert!(store.is_empty().await);

        let session = store.create_session("alice", "Groceries").await.unwrap();
        assert_eq!(store.len().await, 1);

        let loaded = store.get_session(session.id, "alice").await.unwrap();
        assert_eq!(loaded, session);
        assert!(store.exists(session.id, "alice").await.unwrap());

        let renamed = store
            .rename_session(session.id, "alice", "Shopping")
            .await
            .unwrap();
        assert_eq!(renamed.title, "Shopping");
        assert_eq!(
            store.get_session(session.id, "alice").await.unwrap().title,
            "Shopping"
        );

        store.delete_session(session.id, "alice").await.unwrap();
        assert!(!store.exists(session.id, "alice").await.unwrap());
        assert!(store.list_sessions("alice").await.unwrap().is_empty());
        // soft delete keeps the row
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_sessions_are_private_to_their_owner() {
        let store = MemoryStore::new();
        let session = store.create_session("alice", "Secret").await.unwrap();

        assert!(matches!(
            store.get_session(session.id, "bob").await,
            Err(SessionError::NotFound(id)) if id == session.id
        ));
        assert!(matches!(
            store.rename_session(session.id, "bob", "Mine").await,
            Err(SessionError::NotFound(_))
        ));
        assert!(matches!(
            store.delete_session(session.id, "bob").await,
            Err(SessionError::NotFound(_))
        ));
        assert!(store.list_sessions("bob").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deleted_session_cannot_be_deleted_twice() {
        let store = MemoryStore::new();
        let session = store.create_session("alice", "t").await.unwrap();

        store.delete_session(session.id, "alice").await.unwrap();
        assert!(matches!(
            store.delete_session(session.id, "alice").await,
            Err(SessionError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let store = MemoryStore::new();
        let first = store.create_session("alice", "First").await.unwrap();
        let second = store.create_session("alice", "Second").await.unwrap();
        let third = store.create_session("alice", "Third").await.unwrap();
        store.create_session("bob", "Other").await.unwrap();
        store.delete_session(second.id, "alice").await.unwrap();

        let ids: Vec<_> = store
            .list_sessions("alice")
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec![third.id, first.id]);
    }

    #[tokio::test]
    async fn test_messages_in_chronological_order() {
        let store = MemoryStore::new();
        let session = store.create_session("alice", "t").await.unwrap();

        store
            .append_message(session.id, Role::User, "Hi")
            .await
            .unwrap();
        store
            .append_message(session.id, Role::Assistant, "Hello!")
            .await
            .unwrap();
        store
            .append_message(session.id, Role::User, "Bye")
            .await
            .unwrap();

        let contents: Vec<_> = store
            .messages(session.id)
            .await
            .unwrap()
            .into_iter()
            .map(|m| (m.role, m.content))
            .collect();
        assert_eq!(
            contents,
            vec![
                (Role::User, "Hi".to_string()),
                (Role::Assistant, "Hello!".to_string()),
                (Role::User, "Bye".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_append_to_unknown_session() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();

        assert!(matches!(
            store.append_message(id, Role::User, "Hi").await,
            Err(SessionError::NotFound(missing)) if missing == id
        ));
        assert!(matches!(
            store.messages(id).await,
            Err(SessionError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_appends() {
        let store = MemoryStore::new();
        let session = store.create_session("alice", "t").await.unwrap();
        let mut handles = vec![];

        for i in 0..10 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .append_message(session.id, Role::User, &format!("message {}", i))
                    .await
                    .unwrap()
                    .id
            }));
        }

        let ids: Vec<Uuid> = futures::future::join_all(handles)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        let stored = store.messages(session.id).await.unwrap();
        assert_eq!(stored.len(), 10);
        for id in ids {
            assert!(stored.iter().any(|m| m.id == id));
        }
    }
}
