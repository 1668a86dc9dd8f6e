//! Provider selection and one-shot fallback
//!
//! The [`Dispatcher`] holds a primary provider and an optional secondary. A
//! request goes to the primary first; when it fails in a recoverable way the
//! secondary gets exactly one chance. Nothing above the dispatcher retries.

use crate::normalizer::{Head, Normalizer};
use crate::settings::{ProviderKind, Settings};
use futures::{future, stream, StreamExt};
use parley_core::{
    CanonicalChunk, ChunkStream, Conversation, Error, ProviderClient, ProviderResult, Result,
    ERROR_SENTINEL,
};
use parley_providers::{GeminiBuilder, OpenAIBuilder};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How a streaming reply reacts to a primary failure after its first chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamMode {
    /// Forward primary chunks as they arrive. A mid-stream failure starts a
    /// fresh secondary stream whose content is appended after the primary
    /// content already delivered, so the transcript may be spliced.
    #[default]
    Splice,
    /// Hold the whole primary reply before forwarding anything. Any primary
    /// failure discards it and only the secondary's reply is delivered.
    Buffered,
}

impl StreamMode {
    /// Lowercase name as used in configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamMode::Splice => "splice",
            StreamMode::Buffered => "buffered",
        }
    }
}

impl FromStr for StreamMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "splice" => Ok(StreamMode::Splice),
            "buffered" => Ok(StreamMode::Buffered),
            other => Err(Error::Configuration(format!(
                "unknown stream mode '{}', expected 'splice' or 'buffered'",
                other
            ))),
        }
    }
}

impl fmt::Display for StreamMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of reply requested from [`Dispatcher::dispatch`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Wait for the full text
    Complete,
    /// Receive chunks as they are produced
    Stream,
}

/// Routes requests to a primary provider with a single fallback
///
/// Cloning is cheap; providers are shared read-only.
///
/// # Example
///
/// ```no_run
/// use parley_dispatch::{Dispatcher, Settings};
/// use parley_core::{Conversation, Turn};
///
/// # async fn example() -> parley_core::Result<()> {
/// let dispatcher = Dispatcher::from_settings(&Settings::from_env()?)?;
/// let conversation = Conversation::new().with_turn(Turn::user("Hi"));
/// let reply = dispatcher.generate(&conversation).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Dispatcher {
    primary: Arc<dyn ProviderClient>,
    secondary: Option<Arc<dyn ProviderClient>>,
    mode: StreamMode,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("primary", &self.primary.name())
            .field("secondary", &self.secondary.as_ref().map(|s| s.name()))
            .field("mode", &self.mode)
            .finish()
    }
}

/// Builder for [`Dispatcher`]
#[derive(Default)]
pub struct DispatcherBuilder {
    primary: Option<Arc<dyn ProviderClient>>,
    secondary: Option<Arc<dyn ProviderClient>>,
    mode: StreamMode,
}

impl DispatcherBuilder {
    /// Set the provider tried first
    pub fn primary(mut self, provider: Arc<dyn ProviderClient>) -> Self {
        self.primary = Some(provider);
        self
    }

    /// Set the fallback provider
    pub fn secondary(mut self, provider: Arc<dyn ProviderClient>) -> Self {
        self.secondary = Some(provider);
        self
    }

    /// Set the reaction to mid-stream failures
    pub fn stream_mode(mut self, mode: StreamMode) -> Self {
        self.mode = mode;
        self
    }

    /// Build the dispatcher; fails when no primary is set
    pub fn build(self) -> Result<Dispatcher> {
        let primary = self.primary.ok_or(Error::NoProviderConfigured)?;
        info!(
            primary = primary.name(),
            secondary = self.secondary.as_ref().map(|s| s.name()),
            mode = %self.mode,
            "dispatcher ready"
        );
        Ok(Dispatcher {
            primary,
            secondary: self.secondary,
            mode: self.mode,
        })
    }
}

impl Dispatcher {
    /// Start building a dispatcher
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    /// Build the providers named by `settings` and apply the preference rule
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let (primary, secondary) = settings.select()?;

        let mut builder = Self::builder()
            .primary(build_provider(primary, settings)?)
            .stream_mode(settings.stream_mode);
        if let Some(secondary) = secondary {
            builder = builder.secondary(build_provider(secondary, settings)?);
        }
        builder.build()
    }

    /// Name of the primary provider
    pub fn primary_name(&self) -> &str {
        self.primary.name()
    }

    /// Name of the secondary provider, if any
    pub fn secondary_name(&self) -> Option<&str> {
        self.secondary.as_deref().map(|s| s.name())
    }

    /// The configured stream mode
    pub fn stream_mode(&self) -> StreamMode {
        self.mode
    }

    /// One-shot completion with at most one fallback
    ///
    /// Empty text and text starting with the `Error:` sentinel count as
    /// failures. When both providers fail the result is
    /// [`Error::AllProvidersFailed`] carrying both causes.
    pub async fn generate(&self, conversation: &Conversation) -> Result<String> {
        let primary = self.primary.name();
        let cause = match accept(primary, self.primary.generate(conversation).await) {
            Ok(text) => {
                debug!(provider = primary, length = text.len(), "completion succeeded");
                return Ok(text);
            }
            Err(e) => e,
        };

        let Some(secondary) = self.fallback_for(&cause) else {
            warn!(provider = primary, error = %cause, "completion failed without fallback");
            return Err(cause);
        };

        warn!(
            provider = primary,
            fallback = secondary.name(),
            error = %cause,
            "completion failed, falling back"
        );

        accept(secondary.name(), secondary.generate(conversation).await).map_err(|e| {
            warn!(provider = secondary.name(), error = %e, "fallback completion failed");
            Error::AllProvidersFailed {
                primary: Box::new(cause),
                secondary: Box::new(e),
            }
        })
    }

    /// Streaming completion with at most one fallback
    ///
    /// The stream is lazy: no provider is contacted until it is first polled.
    /// Dropping it drops whatever provider request is in flight, and no
    /// further provider call is started afterwards.
    pub fn stream(&self, conversation: &Conversation) -> ChunkStream {
        let route = self.clone();
        let conversation = conversation.clone();

        stream::once(async move { route.open(conversation).await })
            .flatten()
            .boxed()
    }

    /// Single entry point returning either reply shape
    pub async fn dispatch(
        &self,
        conversation: &Conversation,
        delivery: Delivery,
    ) -> Result<ProviderResult> {
        match delivery {
            Delivery::Complete => self.generate(conversation).await.map(ProviderResult::Complete),
            Delivery::Stream => Ok(ProviderResult::Stream(self.stream(conversation))),
        }
    }

    fn fallback_for(&self, cause: &Error) -> Option<Arc<dyn ProviderClient>> {
        if !cause.is_recoverable() {
            return None;
        }
        self.secondary.clone()
    }

    async fn open(self, conversation: Conversation) -> ChunkStream {
        let primary = self.primary.name().to_string();
        debug!(provider = %primary, mode = %self.mode, "opening stream");

        let head = Normalizer::new(&primary, self.primary.stream(&conversation))
            .head()
            .await;

        let (first, rest) = match head {
            Head::Ready(first, rest) => (first, rest),
            Head::Failed(cause) => return self.recover(&conversation, cause, "first chunk").await,
            Head::Exhausted => {
                let cause = Error::EmptyResponse { provider: primary };
                return self.recover(&conversation, cause, "first chunk").await;
            }
        };

        match self.mode {
            StreamMode::Splice => self.splice(first, rest, conversation),
            StreamMode::Buffered => self.buffered(first, rest, conversation).await,
        }
    }

    /// Switch to the secondary after `cause`, or surface `cause` alone
    async fn recover(&self, conversation: &Conversation, cause: Error, stage: &str) -> ChunkStream {
        let primary = self.primary.name();
        let Some(secondary) = self.fallback_for(&cause) else {
            warn!(provider = primary, error = %cause, stage, "stream failed without fallback");
            return failed(cause);
        };

        warn!(
            provider = primary,
            fallback = secondary.name(),
            error = %cause,
            stage,
            "stream failed, falling back"
        );
        open_fallback(secondary, conversation, cause).await
    }

    fn splice(
        self,
        first: CanonicalChunk,
        rest: ChunkStream,
        conversation: Conversation,
    ) -> ChunkStream {
        let state = Splice::Primary {
            rest,
            route: self,
            conversation,
        };

        let tail = stream::unfold(state, |state| async move {
            match state {
                Splice::Primary {
                    mut rest,
                    route,
                    conversation,
                } => match rest.next().await {
                    Some(Ok(chunk)) => Some((
                        Ok(chunk),
                        Splice::Primary {
                            rest,
                            route,
                            conversation,
                        },
                    )),
                    Some(Err(cause)) => {
                        drop(rest);
                        let mut next = route.recover(&conversation, cause, "mid-stream").await;
                        let item = next.next().await?;
                        Some((item, Splice::Fallback(next)))
                    }
                    None => None,
                },
                Splice::Fallback(mut next) => {
                    let item = next.next().await?;
                    Some((item, Splice::Fallback(next)))
                }
            }
        });

        stream::once(future::ready(Ok(first))).chain(tail).boxed()
    }

    async fn buffered(
        self,
        first: CanonicalChunk,
        mut rest: ChunkStream,
        conversation: Conversation,
    ) -> ChunkStream {
        let primary = self.primary.name().to_string();
        let mut held = vec![first];
        let mut cause = None;

        while let Some(item) = rest.next().await {
            match item {
                Ok(CanonicalChunk::Error { error }) => {
                    cause = Some(Error::signalled(primary.as_str(), error));
                    break;
                }
                Ok(chunk) => held.push(chunk),
                Err(e) => {
                    cause = Some(e);
                    break;
                }
            }
        }
        drop(rest);

        match cause {
            None => {
                debug!(provider = %primary, chunks = held.len(), "forwarding buffered reply");
                stream::iter(held.into_iter().map(Ok)).boxed()
            }
            Some(cause) if self.secondary.is_some() && cause.is_recoverable() => {
                debug!(provider = %primary, discarded = held.len(), "discarding buffered reply");
                self.recover(&conversation, cause, "mid-stream").await
            }
            Some(cause) => {
                warn!(provider = %primary, error = %cause, "stream failed without fallback");
                stream::iter(held.into_iter().map(Ok))
                    .chain(stream::once(future::ready(Err(cause))))
                    .boxed()
            }
        }
    }
}

enum Splice {
    Primary {
        rest: ChunkStream,
        route: Dispatcher,
        conversation: Conversation,
    },
    Fallback(ChunkStream),
}

/// Open the secondary stream; a failed head ends the request
async fn open_fallback(
    secondary: Arc<dyn ProviderClient>,
    conversation: &Conversation,
    cause: Error,
) -> ChunkStream {
    let name = secondary.name().to_string();
    let head = Normalizer::new(&name, secondary.stream(conversation))
        .head()
        .await;

    match head {
        Head::Ready(first, rest) => stream::once(future::ready(Ok(first))).chain(rest).boxed(),
        Head::Failed(e) => {
            warn!(provider = %name, error = %e, "fallback stream failed");
            failed(Error::AllProvidersFailed {
                primary: Box::new(cause),
                secondary: Box::new(e),
            })
        }
        Head::Exhausted => {
            warn!(provider = %name, "fallback stream was empty");
            failed(Error::AllProvidersFailed {
                primary: Box::new(cause),
                secondary: Box::new(Error::EmptyResponse { provider: name }),
            })
        }
    }
}

fn failed(error: Error) -> ChunkStream {
    stream::once(future::ready(Err(error))).boxed()
}

/// Treat empty and sentinel-prefixed text as failure
fn accept(provider: &str, reply: Result<String>) -> Result<String> {
    let text = reply?;
    if text.trim().is_empty() {
        return Err(Error::EmptyResponse {
            provider: provider.to_string(),
        });
    }
    if let Some(reason) = text.strip_prefix(ERROR_SENTINEL) {
        return Err(Error::signalled(provider, reason.trim()));
    }
    Ok(text)
}

fn build_provider(kind: ProviderKind, settings: &Settings) -> Result<Arc<dyn ProviderClient>> {
    let missing = || Error::Configuration(format!("{} credential missing", kind));

    match kind {
        ProviderKind::OpenAI => {
            let key = settings.openai_api_key.as_deref().ok_or_else(missing)?;
            let mut builder = OpenAIBuilder::new(key).timeout(settings.http_timeout);
            if let Some(model) = &settings.openai_model {
                builder = builder.model(model);
            }
            if let Some(url) = &settings.openai_base_url {
                builder = builder.base_url(url);
            }
            Ok(Arc::new(builder.build()?))
        }
        ProviderKind::Gemini => {
            let key = settings.gemini_api_key.as_deref().ok_or_else(missing)?;
            let mut builder = GeminiBuilder::new(key)
                .timeout(settings.http_timeout)
                .stream_delay(settings.stream_delay)
                .chunk_unit(settings.chunk_unit);
            if let Some(model) = &settings.gemini_model {
                builder = builder.model(model);
            }
            if let Some(url) = &settings.gemini_base_url {
                builder = builder.base_url(url);
            }
            Ok(Arc::new(builder.build()?))
        }
    }
}
