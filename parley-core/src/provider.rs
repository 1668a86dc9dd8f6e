//! Core capability trait for LLM providers

use crate::error::Result;
use crate::types::chunk::ChunkStream;
use crate::types::conversation::Conversation;
use async_trait::async_trait;

/// What a provider can do natively
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Whether the vendor delivers replies incrementally
    pub native_streaming: bool,
}

/// The capability contract every provider client implements
///
/// Implementations translate a [`Conversation`] into one vendor's request
/// shape, perform the network call and translate the reply back. Vendor role
/// names never cross this boundary.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Short provider name used in logs and errors (e.g. "openai")
    fn name(&self) -> &str;

    /// Advertised capabilities
    fn capabilities(&self) -> Capabilities;

    /// Blocking one-shot completion
    async fn generate(&self, conversation: &Conversation) -> Result<String>;

    /// Lazy chunk stream for the reply
    ///
    /// Nothing is sent until the stream is first polled, and dropping the
    /// stream aborts any request in flight. Providers without native
    /// streaming perform the full completion first and re-emit it in small
    /// units.
    fn stream(&self, conversation: &Conversation) -> ChunkStream;
}
