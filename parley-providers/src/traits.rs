//! Common traits for provider implementations

use parley_core::{CanonicalChunk, Conversation, Error};
use serde_json::Value;

/// Convert conversations to provider-specific format
pub trait RequestConverter: Send + Sync {
    /// Convert a conversation to the vendor's JSON request body
    fn convert(&self, conversation: &Conversation) -> Result<Value, Error>;
}

/// Parse responses from provider-specific format
pub trait ResponseParser: Send + Sync {
    /// Extract the reply text from a one-shot response
    fn parse_text(&self, value: Value) -> Result<String, Error>;
}

/// Parse streaming events from provider-specific format
pub trait StreamEventParser: Send + Sync {
    /// Parse one `data:` payload
    ///
    /// `Ok(None)` means the payload carried nothing to forward.
    fn parse_event(&self, data: &str) -> Result<Option<CanonicalChunk>, Error>;
}
