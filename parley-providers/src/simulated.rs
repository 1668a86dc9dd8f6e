//! Simulated streaming for vendors without native streaming
//!
//! The full reply is already in hand. It is cut into small units and
//! re-emitted one at a time with a [`Pacer`] wait between emits, so the
//! concatenation of the emitted chunks is exactly the original text.

use crate::pacing::Pacer;
use futures::{stream, Stream};
use parley_core::{CanonicalChunk, ChunkStream, Result};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// Granularity of a simulated stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChunkUnit {
    /// One character per chunk
    #[default]
    Char,
    /// One word per chunk, trailing whitespace attached
    Word,
}

/// Cut `text` into emit units; joining them gives back `text`
pub fn split_units(text: &str, unit: ChunkUnit) -> Vec<String> {
    match unit {
        ChunkUnit::Char => text.chars().map(String::from).collect(),
        ChunkUnit::Word => {
            let mut units = Vec::new();
            let mut current = String::new();
            let mut in_space = false;
            let mut has_word = false;
            for c in text.chars() {
                if !c.is_whitespace() {
                    if in_space && has_word {
                        units.push(std::mem::take(&mut current));
                    }
                    has_word = true;
                }
                in_space = c.is_whitespace();
                current.push(c);
            }
            if !current.is_empty() {
                units.push(current);
            }
            units
        }
    }
}

/// Lazy, single-pass stream of `Content` chunks over a finished reply
pub struct SimulatedStream {
    inner: ChunkStream,
}

impl SimulatedStream {
    /// Build the stream; the first chunk is emitted without a wait
    pub fn new(text: &str, unit: ChunkUnit, pacer: Arc<dyn Pacer>) -> Self {
        let units = split_units(text, unit).into_iter();

        let inner = stream::unfold((units, pacer, true), |(mut units, pacer, first)| async move {
            let unit = units.next()?;
            if !first {
                pacer.pause().await;
            }
            Some((Ok(CanonicalChunk::content(unit)), (units, pacer, false)))
        });

        Self {
            inner: Box::pin(inner),
        }
    }
}

impl Stream for SimulatedStream {
    type Item = Result<CanonicalChunk>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}
