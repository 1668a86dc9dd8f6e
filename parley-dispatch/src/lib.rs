//! Provider dispatch for the Parley chat backend
//!
//! This crate decides which provider answers a conversation, falls back to
//! the other one at most once, and normalizes provider streams into the
//! canonical chunk contract.

mod dispatcher;
mod normalizer;
mod settings;

#[cfg(test)]
mod testing;

pub use dispatcher::{Delivery, Dispatcher, DispatcherBuilder, StreamMode};
pub use normalizer::{Head, Normalizer};
pub use settings::{select_providers, ProviderKind, Settings};

/// Prelude module for convenient imports
pub mod prelude {
    pub use super::{Delivery, Dispatcher, Settings, StreamMode};
    pub use parley_core::{CanonicalChunk, Conversation, Role, Turn};
}
