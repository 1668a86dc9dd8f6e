//! Chat sessions for Parley
//!
//! This crate owns the conversation history of each user. A [`ChatService`]
//! resolves or creates a session, persists the user turn, asks the
//! dispatcher for a reply and persists the assistant turn, either in one
//! shot or while relaying the reply as newline-delimited JSON.

pub mod error;
pub mod service;
pub mod store;
pub mod types;

pub use error::{SessionError, SessionResult};
pub use service::ChatService;
pub use store::{MemoryStore, SessionStore};
pub use types::{session_title, ChatMessage, ChatRequest, ChatSession, TITLE_MAX_CHARS};
