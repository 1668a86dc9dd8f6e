//! Streaming implementation for OpenAI

use crate::http::ResponseStream;
use crate::openai::parser::OpenAIParser;
use crate::openai::provider::PROVIDER_NAME;
use crate::stream_utils::{parse_sse_line, LineBuffer};
use crate::traits::StreamEventParser;
use futures::Stream;
use parley_core::{CanonicalChunk, Error};
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

/// OpenAI server-sent event stream
///
/// Ends at `[DONE]`, at the end of the body, or right after the first error
/// it yields.
pub struct OpenAIStream {
    inner: ResponseStream,
    lines: LineBuffer,
    pending: VecDeque<Result<CanonicalChunk, Error>>,
    parser: OpenAIParser,
    finished: bool,
}

impl OpenAIStream {
    /// Create a new OpenAI stream over a response body
    pub fn new(body: ResponseStream) -> Self {
        Self {
            inner: body,
            lines: LineBuffer::new(),
            pending: VecDeque::new(),
            parser: OpenAIParser,
            finished: false,
        }
    }

    fn handle_line(&mut self, line: &str) {
        if self.finished {
            return;
        }
        let Some(("data", data)) = parse_sse_line(line) else {
            return;
        };
        if data == "[DONE]" {
            self.finished = true;
            return;
        }

        match self.parser.parse_event(data) {
            Ok(Some(chunk)) => {
                if chunk.is_error() {
                    self.finished = true;
                }
                self.pending.push_back(Ok(chunk));
            }
            Ok(None) => {}
            Err(e) => {
                self.finished = true;
                self.pending.push_back(Err(e));
            }
        }
    }
}

impl Stream for OpenAIStream {
    type Item = Result<CanonicalChunk, Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                return Poll::Ready(Some(item));
            }
            if self.finished {
                return Poll::Ready(None);
            }

            match self.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    for line in self.lines.add_data(&bytes) {
                        self.handle_line(&line);
                    }
                }
                Poll::Ready(Some(Err(e))) => {
                    self.finished = true;
                    return Poll::Ready(Some(Err(e.into_core(PROVIDER_NAME))));
                }
                Poll::Ready(None) => {
                    if let Some(line) = self.lines.flush() {
                        self.handle_line(&line);
                    }
                    self.finished = true;
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
