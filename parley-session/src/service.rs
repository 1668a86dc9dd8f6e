//! Chat orchestration over a session store and a dispatcher
//!
//! [`ChatService`] is the piece a transport layer talks to. It keeps the
//! session history consistent with what the user was shown:
//!
//! * the user turn is persisted before any provider is contacted;
//! * a failed reply, one-shot or streamed, is persisted as an
//!   `Error: <reason>` assistant turn;
//! * a streamed reply is persisted only after it was fully relayed, so a
//!   consumer that disconnects leaves no half-written assistant turn.

use crate::types::{conversation_from, session_title};
use crate::{ChatMessage, ChatRequest, ChatSession, SessionError, SessionResult, SessionStore};
use futures::StreamExt;
use parley_core::{CanonicalChunk, Conversation, Error, Role, TextAccumulator, ERROR_SENTINEL};
use parley_dispatch::Dispatcher;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Resolves sessions, persists turns and relays replies
#[derive(Clone)]
pub struct ChatService {
    dispatcher: Arc<Dispatcher>,
    store: Arc<dyn SessionStore>,
}

impl std::fmt::Debug for ChatService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatService")
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

impl ChatService {
    /// Create a service over a dispatcher and a store
    pub fn new(dispatcher: Arc<Dispatcher>, store: Arc<dyn SessionStore>) -> Self {
        Self { dispatcher, store }
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Sessions of `user_id`, newest first
    pub async fn sessions(&self, user_id: &str) -> SessionResult<Vec<ChatSession>> {
        self.store.list_sessions(user_id).await
    }

    /// A session together with its messages in chronological order
    pub async fn session(
        &self,
        user_id: &str,
        id: uuid::Uuid,
    ) -> SessionResult<(ChatSession, Vec<ChatMessage>)> {
        let session = self.store.get_session(id, user_id).await?;
        let messages = self.store.messages(id).await?;
        Ok((session, messages))
    }

    /// One-shot reply
    ///
    /// Returns the persisted assistant message. When dispatch fails the
    /// message carries the `Error:` sentinel and the reason instead of a
    /// reply; the call itself still succeeds.
    pub async fn send(&self, user_id: &str, request: ChatRequest) -> SessionResult<ChatMessage> {
        let (session, conversation) = self.prepare(user_id, &request).await?;

        let content = match self.dispatcher.generate(&conversation).await {
            Ok(text) => text,
            Err(e) => {
                warn!(session_id = %session.id, error = %e, "reply failed");
                format!("{ERROR_SENTINEL} {e}")
            }
        };

        let reply = self
            .store
            .append_message(session.id, Role::Assistant, &content)
            .await?;
        debug!(session_id = %session.id, message_id = %reply.id, "saved assistant reply");
        Ok(reply)
    }

    /// Streamed reply relayed to `sink` as newline-delimited JSON
    ///
    /// The first line is the `session_id` envelope and, once the reply is
    /// persisted, the last line is the `message_id` envelope. A failure
    /// while streaming is relayed as an `error` line and persisted as an
    /// `Error: <reason>` turn in place of the partial text. If the receiving end
    /// of `sink` is dropped, the provider stream is dropped with it and the
    /// call fails with [`Error::Cancelled`] without persisting a reply.
    pub async fn stream(
        &self,
        user_id: &str,
        request: ChatRequest,
        sink: mpsc::Sender<String>,
    ) -> SessionResult<ChatMessage> {
        let (session, conversation) = self.prepare(user_id, &request).await?;

        emit(&sink, &CanonicalChunk::session_id(session.id.to_string())).await?;

        let mut reply = self.dispatcher.stream(&conversation);
        let mut text = TextAccumulator::new();
        let mut failure = None;
        loop {
            let item = tokio::select! {
                biased;
                _ = sink.closed() => None,
                item = reply.next() => Some(item),
            };
            let chunk = match item {
                None => {
                    info!(session_id = %session.id, "consumer disconnected");
                    return Err(Error::Cancelled.into());
                }
                Some(None) => break,
                Some(Some(Ok(chunk))) => chunk,
                Some(Some(Err(e))) => {
                    warn!(session_id = %session.id, error = %e, "stream failed");
                    // nothing was produced at all, which the apology covers
                    if !matches!(e, Error::EmptyResponse { .. }) {
                        failure = Some(e.to_string());
                    }
                    emit(&sink, &CanonicalChunk::error(e.to_string())).await?;
                    break;
                }
            };

            if let CanonicalChunk::Error { error } = &chunk {
                failure = Some(error.clone());
            }
            text.push(&chunk);
            emit(&sink, &chunk).await?;
            if chunk.is_error() {
                break;
            }
        }
        drop(reply);

        debug!(
            session_id = %session.id,
            chunks = text.chunk_count(),
            failed = failure.is_some(),
            "stream complete, saving assistant reply"
        );
        let content = match failure {
            Some(reason) => format!("{ERROR_SENTINEL} {reason}"),
            None => text.into_text_or_fallback(),
        };
        let message = self
            .store
            .append_message(session.id, Role::Assistant, &content)
            .await?;

        if emit(&sink, &CanonicalChunk::message_id(message.id.to_string()))
            .await
            .is_err()
        {
            debug!(session_id = %session.id, "consumer left before the message id");
        }
        Ok(message)
    }

    /// Resolve or create the session, persist the user turn and rebuild the
    /// conversation from history
    async fn prepare(
        &self,
        user_id: &str,
        request: &ChatRequest,
    ) -> SessionResult<(ChatSession, Conversation)> {
        let session = match request.session_id {
            Some(id) => self.store.get_session(id, user_id).await?,
            None => {
                let session = self
                    .store
                    .create_session(user_id, &session_title(&request.message))
                    .await?;
                info!(session_id = %session.id, user_id, "started new session");
                session
            }
        };

        self.store
            .append_message(session.id, Role::User, &request.message)
            .await?;
        let history = self.store.messages(session.id).await?;
        Ok((session, conversation_from(&history)))
    }
}

async fn emit(sink: &mpsc::Sender<String>, chunk: &CanonicalChunk) -> SessionResult<()> {
    sink.send(chunk.to_ndjson())
        .await
        .map_err(|_| SessionError::Dispatch(Error::Cancelled))
}
