//! Provider clients for the Parley chat backend
//!
//! Two vendors are supported. [`OpenAI`] streams replies natively over
//! server-sent events; [`Gemini`] only offers one-shot completion, so its
//! stream is simulated by re-emitting the full reply in small units.

#![warn(missing_docs)]

pub mod builder;
pub mod constants;
pub mod error;
pub mod http;
pub mod pacing;
pub mod simulated;
pub mod stream_utils;
pub mod traits;

// Provider implementations
pub mod gemini;
pub mod openai;

// Re-export provider types
pub use builder::{GeminiBuilder, OpenAIBuilder, ProviderBuilder};
pub use gemini::{Gemini, GeminiConfig};
pub use openai::{OpenAI, OpenAIConfig};

// Re-export common traits
pub use pacing::{FixedPacer, NoPacer, Pacer};
pub use simulated::{ChunkUnit, SimulatedStream};
pub use traits::{RequestConverter, ResponseParser, StreamEventParser};
