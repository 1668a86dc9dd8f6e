//! Core traits and types for the Parley chat backend
//!
//! This crate provides the abstractions shared by every other Parley crate:
//! the conversation model, the canonical chunk contract that all consumers
//! see regardless of which provider produced a reply, the `ProviderClient`
//! capability trait and the error taxonomy.

#![deny(unsafe_code)]

pub mod error;
pub mod provider;
pub mod types;

// Re-export commonly used items
pub use error::{Error, Result};
pub use provider::{Capabilities, ProviderClient};
pub use types::{
    chunk::{CanonicalChunk, ChunkStream},
    conversation::{Conversation, Role, Turn},
    result::{ProviderResult, TextAccumulator, ERROR_SENTINEL, FALLBACK_REPLY},
};
