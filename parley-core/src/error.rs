//! Error types for Parley

use std::error::Error as StdError;
use thiserror::Error;

/// The main error type for all Parley operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Neither provider has a credential configured
    #[error("No AI provider configured: set OPENAI_API_KEY or GEMINI_API_KEY")]
    NoProviderConfigured,

    /// The provider answered with a non-success HTTP status
    #[error("Provider error ({provider}): HTTP {status}: {body}")]
    Provider {
        /// Provider name (e.g., "openai", "gemini")
        provider: String,
        /// HTTP status code
        status: u16,
        /// Response body, as returned by the vendor
        body: String,
    },

    /// The reply could not be parsed into extractable text
    #[error("Malformed response ({provider}): {message}")]
    MalformedResponse {
        /// Provider name
        provider: String,
        /// What was wrong with the payload
        message: String,
    },

    /// The reply parsed but carried no content
    #[error("Empty response ({provider})")]
    EmptyResponse {
        /// Provider name
        provider: String,
    },

    /// The provider reported a failure in-band (error chunk or sentinel text)
    #[error("Provider signalled failure ({provider}): {message}")]
    Signalled {
        /// Provider name
        provider: String,
        /// Reported message
        message: String,
    },

    /// An `error` chunk read back from an already dispatched stream
    #[error("Stream reported an error: {0}")]
    StreamError(String),

    /// Transport failure before a response was received
    #[error("Network error ({provider}): {message}")]
    Network {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
        /// Underlying error if available
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },

    /// The HTTP client timeout elapsed
    #[error("Request to {provider} timed out")]
    Timeout {
        /// Provider name
        provider: String,
    },

    /// Both the primary and the fallback provider failed
    #[error("All providers failed: primary: {primary}; fallback: {secondary}")]
    AllProvidersFailed {
        /// Failure of the primary provider
        primary: Box<Error>,
        /// Failure of the fallback provider
        secondary: Box<Error>,
    },

    /// The consumer stopped draining the reply
    #[error("Request cancelled by the consumer")]
    Cancelled,

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type alias for Parley operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether this error is eligible for the single provider fallback
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Provider { .. }
                | Error::MalformedResponse { .. }
                | Error::EmptyResponse { .. }
                | Error::Signalled { .. }
                | Error::Network { .. }
                | Error::Timeout { .. }
        )
    }

    /// Name of the provider that produced this error, if any
    pub fn provider(&self) -> Option<&str> {
        match self {
            Error::Provider { provider, .. }
            | Error::MalformedResponse { provider, .. }
            | Error::EmptyResponse { provider }
            | Error::Signalled { provider, .. }
            | Error::Network { provider, .. }
            | Error::Timeout { provider } => Some(provider),
            _ => None,
        }
    }

    /// Create a malformed response error
    pub fn malformed(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Error::MalformedResponse {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create an in-band failure error
    pub fn signalled(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Signalled {
            provider: provider.into(),
            message: message.into(),
        }
    }
}
