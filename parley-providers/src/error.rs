//! Transport errors and their mapping onto core errors

use parley_core::Error as CoreError;
use std::time::Duration;
use thiserror::Error;

/// Failure at the HTTP layer, before a provider has attached its name
#[derive(Debug, Error)]
pub enum HttpError {
    /// Non-success status code
    #[error("HTTP {status}: {body}")]
    Status {
        /// Status code
        status: u16,
        /// Response body text
        body: String,
    },

    /// The request or the response headers took longer than the timeout
    #[error("request timed out")]
    Timeout,

    /// A streaming body stopped producing bytes
    #[error("stream idle for {0:?}")]
    Idle(Duration),

    /// The body was not valid JSON
    #[error("invalid JSON body: {0}")]
    Decode(#[source] serde_json::Error),

    /// Connection or protocol failure
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),
}

impl HttpError {
    /// Tag the error with a provider name
    pub fn into_core(self, provider: &str) -> CoreError {
        match self {
            HttpError::Status { status, body } => CoreError::Provider {
                provider: provider.to_string(),
                status,
                body,
            },
            HttpError::Timeout | HttpError::Idle(_) => CoreError::Timeout {
                provider: provider.to_string(),
            },
            HttpError::Decode(e) => CoreError::malformed(provider, e.to_string()),
            HttpError::Transport(e) => network_error(provider, e),
        }
    }
}

impl From<reqwest::Error> for HttpError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            HttpError::Timeout
        } else {
            HttpError::Transport(error)
        }
    }
}

/// Convert network errors to core errors
pub fn network_error(provider: &str, error: reqwest::Error) -> CoreError {
    CoreError::Network {
        provider: provider.to_string(),
        message: error.to_string(),
        source: Some(Box::new(error)),
    }
}

/// Convert serialization errors to core errors
pub fn serialization_error(provider: &str, error: serde_json::Error) -> CoreError {
    CoreError::malformed(provider, format!("failed to parse response: {}", error))
}
