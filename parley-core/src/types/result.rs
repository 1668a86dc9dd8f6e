//! Provider results and text accumulation

use crate::error::{Error, Result};
use crate::types::chunk::{CanonicalChunk, ChunkStream};
use futures::StreamExt;
use std::fmt;

/// Prefix that marks a failure placeholder rather than a genuine reply
pub const ERROR_SENTINEL: &str = "Error:";

/// Assistant text persisted when a streamed reply produced no content
pub const FALLBACK_REPLY: &str =
    "Sorry, I wasn't able to generate a response. Please try again.";

/// The reply of one provider invocation
pub enum ProviderResult {
    /// A one-shot, fully materialized reply
    Complete(String),
    /// An incremental reply
    Stream(ChunkStream),
}

impl ProviderResult {
    /// Drain the result into its full text
    ///
    /// A drained stream yields the same text a `Complete` result would have
    /// carried for the same conversation.
    pub async fn into_text(self) -> Result<String> {
        match self {
            ProviderResult::Complete(text) => Ok(text),
            ProviderResult::Stream(mut stream) => {
                let mut accumulator = TextAccumulator::new();
                while let Some(item) = stream.next().await {
                    let chunk = item?;
                    if let CanonicalChunk::Error { error } = &chunk {
                        return Err(Error::StreamError(error.clone()));
                    }
                    accumulator.push(&chunk);
                }
                Ok(accumulator.into_text())
            }
        }
    }

    /// Whether this result is incremental
    pub fn is_stream(&self) -> bool {
        matches!(self, ProviderResult::Stream(_))
    }
}

impl fmt::Debug for ProviderResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderResult::Complete(text) => f.debug_tuple("Complete").field(text).finish(),
            ProviderResult::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Accumulates content chunks into the complete reply text
#[derive(Debug, Default)]
pub struct TextAccumulator {
    content: String,
    chunks: usize,
}

impl TextAccumulator {
    /// Create a new accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a chunk; only `Content` contributes text
    pub fn push(&mut self, chunk: &CanonicalChunk) {
        if let Some(text) = chunk.as_content() {
            self.content.push_str(text);
            self.chunks += 1;
        }
    }

    /// The text accumulated so far
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Number of content chunks seen
    pub fn chunk_count(&self) -> usize {
        self.chunks
    }

    /// Whether no text has been accumulated
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Finish, returning the accumulated text
    pub fn into_text(self) -> String {
        self.content
    }

    /// Finish, substituting [`FALLBACK_REPLY`] when nothing was produced
    pub fn into_text_or_fallback(self) -> String {
        if self.content.is_empty() {
            FALLBACK_REPLY.to_string()
        } else {
            self.content
        }
    }
}
