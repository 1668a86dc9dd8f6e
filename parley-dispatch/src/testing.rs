//! Scripted provider clients for dispatcher tests

use async_trait::async_trait;
use futures::{future, stream, StreamExt};
use parley_core::{Capabilities, CanonicalChunk, ChunkStream, Conversation, Error, ProviderClient};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// One step of a scripted stream
#[derive(Debug, Clone)]
pub enum Step {
    Content(String),
    ErrorChunk(String),
    Fail(u16),
    /// Never completes, like a request still in flight
    Stall,
}

/// Observable counters shared with the test
#[derive(Debug, Default)]
pub struct Calls {
    pub generate: AtomicUsize,
    pub stream: AtomicUsize,
    pub produced: AtomicUsize,
    pub dropped: AtomicBool,
}

impl Calls {
    pub fn generate(&self) -> usize {
        self.generate.load(Ordering::SeqCst)
    }

    pub fn stream(&self) -> usize {
        self.stream.load(Ordering::SeqCst)
    }

    pub fn produced(&self) -> usize {
        self.produced.load(Ordering::SeqCst)
    }

    pub fn dropped(&self) -> bool {
        self.dropped.load(Ordering::SeqCst)
    }
}

/// Sets `dropped` when the stream holding it goes away
struct DropFlag(Arc<Calls>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.dropped.store(true, Ordering::SeqCst);
    }
}

pub struct ScriptedProvider {
    name: &'static str,
    reply: Result<String, u16>,
    steps: Vec<Step>,
    pub calls: Arc<Calls>,
}

impl ScriptedProvider {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            reply: Ok(String::new()),
            steps: Vec::new(),
            calls: Arc::new(Calls::default()),
        }
    }

    /// `generate` returns this text
    pub fn replying(mut self, text: impl Into<String>) -> Self {
        self.reply = Ok(text.into());
        self
    }

    /// `generate` fails with this HTTP status
    pub fn failing(mut self, status: u16) -> Self {
        self.reply = Err(status);
        self
    }

    /// `stream` plays these steps
    pub fn streaming(mut self, steps: Vec<Step>) -> Self {
        self.steps = steps;
        self
    }

    /// `stream` emits these texts as content chunks
    pub fn streaming_text(self, parts: &[&str]) -> Self {
        let steps = parts.iter().map(|p| Step::Content(p.to_string())).collect();
        self.streaming(steps)
    }

    pub fn shared(self) -> (Arc<dyn ProviderClient>, Arc<Calls>) {
        let calls = Arc::clone(&self.calls);
        (Arc::new(self), calls)
    }

    fn failure(&self, status: u16) -> Error {
        Error::Provider {
            provider: self.name.to_string(),
            status,
            body: "scripted failure".to_string(),
        }
    }
}

#[async_trait]
impl ProviderClient for ScriptedProvider {
    fn name(&self) -> &str {
        self.name
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            native_streaming: true,
        }
    }

    async fn generate(&self, _conversation: &Conversation) -> Result<String, Error> {
        self.calls.generate.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(status) => Err(self.failure(*status)),
        }
    }

    fn stream(&self, _conversation: &Conversation) -> ChunkStream {
        let calls = Arc::clone(&self.calls);
        let steps = self.steps.clone().into_iter();
        let failures: Vec<Error> = self
            .steps
            .iter()
            .filter_map(|step| match step {
                Step::Fail(status) => Some(self.failure(*status)),
                _ => None,
            })
            .collect();

        let state = (steps, failures.into_iter(), calls, None::<DropFlag>);
        stream::unfold(state, |(mut steps, mut failures, calls, flag)| async move {
            // counted on first poll, so building the stream is not a call
            let flag = match flag {
                Some(flag) => flag,
                None => {
                    calls.stream.fetch_add(1, Ordering::SeqCst);
                    DropFlag(Arc::clone(&calls))
                }
            };

            let item = match steps.next()? {
                Step::Content(text) => Ok(CanonicalChunk::content(text)),
                Step::ErrorChunk(message) => Ok(CanonicalChunk::error(message)),
                Step::Fail(_) => Err(failures.next()?),
                Step::Stall => future::pending().await,
            };
            calls.produced.fetch_add(1, Ordering::SeqCst);
            Some((item, (steps, failures, calls, Some(flag))))
        })
        .boxed()
    }
}

/// Collect the content of a stream, panicking on errors
pub async fn contents(stream: ChunkStream) -> Vec<String> {
    stream
        .map(|item| match item {
            Ok(CanonicalChunk::Content { content }) => content,
            other => panic!("unexpected item: {other:?}"),
        })
        .collect()
        .await
}
