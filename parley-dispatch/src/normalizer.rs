//! Canonical chunk contract enforcement
//!
//! A [`Normalizer`] wraps one provider stream. Throughout the stream it drops
//! empty `Content` chunks and any envelope chunk a provider might emit, since
//! envelopes belong to the session layer. Only the first surviving item is
//! inspected for failure; later `Error` chunks are forwarded as they are.

use futures::{future, StreamExt};
use parley_core::{CanonicalChunk, ChunkStream, Error};
use std::fmt;

/// Outcome of inspecting the first item of a provider stream
pub enum Head {
    /// The stream produced a usable first chunk; `rest` continues after it
    Ready(CanonicalChunk, ChunkStream),
    /// The first item was an error or an `Error` chunk
    Failed(Error),
    /// The stream ended without producing anything usable
    Exhausted,
}

impl fmt::Debug for Head {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Head::Ready(first, _) => f.debug_tuple("Ready").field(first).finish(),
            Head::Failed(e) => f.debug_tuple("Failed").field(e).finish(),
            Head::Exhausted => f.write_str("Exhausted"),
        }
    }
}

/// Wraps a raw provider stream
pub struct Normalizer {
    provider: String,
    inner: ChunkStream,
}

impl Normalizer {
    /// Wrap the stream of `provider`
    pub fn new(provider: impl Into<String>, stream: ChunkStream) -> Self {
        Self {
            provider: provider.into(),
            inner: stream,
        }
    }

    /// Name of the wrapped provider
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// The cleaned stream, without head inspection
    pub fn into_stream(self) -> ChunkStream {
        clean(self.inner)
    }

    /// Pull the first item and classify it
    ///
    /// Exactly one item is consumed from the cleaned stream; nothing beyond it
    /// is read ahead.
    pub async fn head(self) -> Head {
        let provider = self.provider;
        let mut stream = clean(self.inner);

        match stream.next().await {
            Some(Ok(CanonicalChunk::Error { error })) => {
                Head::Failed(Error::signalled(provider, error))
            }
            Some(Ok(chunk)) => Head::Ready(chunk, stream),
            Some(Err(e)) => Head::Failed(e),
            None => Head::Exhausted,
        }
    }
}

fn clean(stream: ChunkStream) -> ChunkStream {
    stream
        .filter(|item| {
            let keep = match item {
                Ok(CanonicalChunk::Content { content }) => !content.is_empty(),
                Ok(chunk) => !chunk.is_envelope(),
                Err(_) => true,
            };
            future::ready(keep)
        })
        .boxed()
}
