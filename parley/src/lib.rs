//! Parley - the provider dispatch core of a chat backend
//!
//! Parley picks between two LLM providers, normalizes their replies into one
//! canonical chunk stream and fails over from one provider to the other at
//! most once per request, including when the first streamed chunk reports a
//! failure.
//!
//! # Features
//!
//! - **One contract**: every consumer sees the same [`CanonicalChunk`] stream
//! - **Native and simulated streaming**: OpenAI streams over SSE, Gemini
//!   replies are re-emitted in paced pieces
//! - **One-shot fallback**: a failed primary is retried once on the secondary
//! - **Cancellation**: dropping a stream aborts the in-flight request
//! - **Sessions**: history persistence and the NDJSON envelope
//!
//! # Quick Start
//!
//! ```no_run
//! # use parley::prelude::*;
//! #
//! # #[tokio::main]
//! # async fn main() -> Result<(), parley::Error> {
//!     // Reads OPENAI_API_KEY / GEMINI_API_KEY and the PARLEY_* settings
//!     let settings = Settings::from_env()?;
//!     let dispatcher = Dispatcher::from_settings(&settings)?;
//!
//!     let conversation = Conversation::new().with_turn(Turn::user("Hello, world!"));
//!     let reply = dispatcher.generate(&conversation).await?;
//!     println!("{}", reply);
//! #     Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Re-export core types
pub use parley_core::*;

#[cfg(feature = "providers")]
#[cfg_attr(docsrs, doc(cfg(feature = "providers")))]
pub mod providers {
    //! Provider implementations
    pub use parley_providers::*;
}

#[cfg(feature = "dispatch")]
#[cfg_attr(docsrs, doc(cfg(feature = "dispatch")))]
pub mod dispatch {
    //! Provider selection, fallback and normalization
    pub use parley_dispatch::*;
}

#[cfg(feature = "session")]
#[cfg_attr(docsrs, doc(cfg(feature = "session")))]
pub mod session {
    //! Chat sessions and the streaming envelope
    pub use parley_session::*;
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use parley_core::{
        CanonicalChunk, ChunkStream, Conversation, Error, ProviderClient, ProviderResult, Role,
        TextAccumulator, Turn,
    };

    #[cfg(feature = "dispatch")]
    pub use parley_dispatch::{Delivery, Dispatcher, Settings, StreamMode};

    #[cfg(feature = "session")]
    pub use parley_session::{ChatRequest, ChatService, MemoryStore, SessionStore};
}
