//! Sessions, messages and chat requests

use chrono::{DateTime, Utc};
use parley_core::{Conversation, Role, Turn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of message characters kept in a generated session title
pub const TITLE_MAX_CHARS: usize = 30;

/// A conversation owned by one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSession {
    /// Unique identifier for this session
    pub id: Uuid,
    /// Owner of the session
    pub user_id: String,
    /// Display title
    pub title: String,
    /// When this session was created
    pub created_at: DateTime<Utc>,
    /// Soft-delete marker; deleted sessions are invisible to their owner
    #[serde(default)]
    pub is_deleted: bool,
}

impl ChatSession {
    /// Create a new session with a random ID
    pub fn new(user_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            title: title.into(),
            created_at: Utc::now(),
            is_deleted: false,
        }
    }

    /// Whether `user_id` may see this session
    pub fn is_visible_to(&self, user_id: &str) -> bool {
        !self.is_deleted && self.user_id == user_id
    }
}

/// One persisted turn of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique identifier for this message
    pub id: Uuid,
    /// Session the message belongs to
    pub session_id: Uuid,
    /// Who wrote it
    pub role: Role,
    /// Message text
    pub content: String,
    /// When it was persisted
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Create a message stamped with the current time
    pub fn new(session_id: Uuid, role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id,
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// The provider-facing form of this message
    pub fn to_turn(&self) -> Turn {
        Turn::new(self.role, self.content.clone())
    }
}

/// Rebuild the provider conversation from a session's history
pub fn conversation_from(messages: &[ChatMessage]) -> Conversation {
    messages.iter().map(ChatMessage::to_turn).collect()
}

/// A user message, optionally continuing an existing session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Session to continue; a new one is created when absent
    #[serde(default)]
    pub session_id: Option<Uuid>,
    /// The user's message
    pub message: String,
}

impl ChatRequest {
    /// Start a new session with this message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            session_id: None,
            message: message.into(),
        }
    }

    /// Continue the given session
    pub fn in_session(mut self, session_id: Uuid) -> Self {
        self.session_id = Some(session_id);
        self
    }
}

/// Title for a session started by `message`
///
/// The first [`TITLE_MAX_CHARS`] characters, with `...` appended when the
/// message was longer.
pub fn session_title(message: &str) -> String {
    let mut chars = message.chars();
    let head: String = chars.by_ref().take(TITLE_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
