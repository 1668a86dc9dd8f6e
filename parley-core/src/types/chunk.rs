//! Canonical streaming units

use crate::error::Result;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// The normalized streaming unit exposed to every consumer
///
/// Serializes to the newline-delimited wire objects, e.g.
/// `{"type":"content","content":"Hi"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CanonicalChunk {
    /// A piece of generated text
    Content {
        /// The text fragment
        content: String,
    },
    /// Identifier of the persisted assistant message
    MessageId {
        /// Message identifier
        message_id: String,
    },
    /// Identifier of the chat session
    SessionId {
        /// Session identifier
        session_id: String,
    },
    /// A failure reported in-band
    Error {
        /// Human readable error message
        error: String,
    },
}

/// A lazy, single-pass sequence of chunks
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<CanonicalChunk>> + Send>>;

impl CanonicalChunk {
    /// Create a content chunk
    pub fn content(text: impl Into<String>) -> Self {
        CanonicalChunk::Content {
            content: text.into(),
        }
    }

    /// Create an error chunk
    pub fn error(message: impl Into<String>) -> Self {
        CanonicalChunk::Error {
            error: message.into(),
        }
    }

    /// Create a message id envelope chunk
    pub fn message_id(id: impl Into<String>) -> Self {
        CanonicalChunk::MessageId {
            message_id: id.into(),
        }
    }

    /// Create a session id envelope chunk
    pub fn session_id(id: impl Into<String>) -> Self {
        CanonicalChunk::SessionId {
            session_id: id.into(),
        }
    }

    /// Text carried by a content chunk
    pub fn as_content(&self) -> Option<&str> {
        match self {
            CanonicalChunk::Content { content } => Some(content),
            _ => None,
        }
    }

    /// Whether this chunk reports a failure
    pub fn is_error(&self) -> bool {
        matches!(self, CanonicalChunk::Error { .. })
    }

    /// Whether this is a transport envelope chunk rather than provider output
    pub fn is_envelope(&self) -> bool {
        matches!(
            self,
            CanonicalChunk::MessageId { .. } | CanonicalChunk::SessionId { .. }
        )
    }

    /// Render as one newline-terminated JSON line
    pub fn to_ndjson(&self) -> String {
        // Serializing a string-only enum cannot fail.
        let mut line = serde_json::to_string(self).unwrap_or_default();
        line.push('\n');
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_wire_format() {
        assert_eq!(
            CanonicalChunk::content("Hi").to_ndjson(),
            "{\"type\":\"content\",\"content\":\"Hi\"}\n"
        );
        assert_eq!(
            CanonicalChunk::error("boom").to_ndjson(),
            "{\"type\":\"error\",\"error\":\"boom\"}\n"
        );
        assert_eq!(
            CanonicalChunk::session_id("s-1").to_ndjson(),
            "{\"type\":\"session_id\",\"session_id\":\"s-1\"}\n"
        );
        assert_eq!(
            CanonicalChunk::message_id("m-1").to_ndjson(),
            "{\"type\":\"message_id\",\"message_id\":\"m-1\"}\n"
        );
    }

    #[test]
    fn test_parse_wire_line() {
        let chunk: CanonicalChunk =
            serde_json::from_str(r#"{"type":"error","error":"quota"}"#).unwrap();
        assert_eq!(chunk, CanonicalChunk::error("quota"));
        assert!(chunk.is_error());
        assert!(!chunk.is_envelope());
    }

    #[test]
    fn test_accessors() {
        assert_eq!(CanonicalChunk::content("a").as_content(), Some("a"));
        assert_eq!(CanonicalChunk::error("a").as_content(), None);
        assert!(CanonicalChunk::message_id("m").is_envelope());
        assert!(CanonicalChunk::session_id("s").is_envelope());
    }
}
