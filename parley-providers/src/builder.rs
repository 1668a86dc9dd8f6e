//! Builder pattern for provider construction
//!
//! All configuration methods return `self`, and `build()` is the terminal
//! method that constructs the provider. When no HTTP client is injected, a
//! [`ReqwestClient`] with the configured timeout is created.
//!
//! # Examples
//!
//! ```no_run
//! use parley_providers::builder::{GeminiBuilder, OpenAIBuilder};
//! use parley_providers::ChunkUnit;
//! use std::time::Duration;
//!
//! let openai = OpenAIBuilder::new("sk-...")
//!     .model("gpt-4o-mini")
//!     .timeout(Duration::from_secs(30))
//!     .build()
//!     .unwrap();
//!
//! let gemini = GeminiBuilder::new("AIza...")
//!     .chunk_unit(ChunkUnit::Word)
//!     .stream_delay(Duration::from_millis(5))
//!     .build()
//!     .unwrap();
//! ```

use crate::constants::DEFAULT_TIMEOUT_SECS;
use crate::gemini::GeminiConfig;
use crate::http::{HttpClient, ReqwestClient};
use crate::openai::OpenAIConfig;
use crate::pacing::{FixedPacer, Pacer};
use crate::simulated::ChunkUnit;
use crate::{Gemini, OpenAI};
use parley_core::Error;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Common builder trait for all providers
pub trait ProviderBuilder: Sized {
    /// The provider type being built
    type Provider;

    /// Set a custom HTTP client
    ///
    /// Useful for testing or special networking requirements.
    fn with_client(self, client: Arc<dyn HttpClient>) -> Self;

    /// Build the provider
    fn build(self) -> Result<Self::Provider, Error>;
}

fn client_or_default(
    client: Option<Arc<dyn HttpClient>>,
    timeout: Option<Duration>,
) -> Result<Arc<dyn HttpClient>, Error> {
    match client {
        Some(client) => Ok(client),
        None => {
            let timeout = timeout.unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
            Ok(Arc::new(ReqwestClient::with_timeout(timeout)?))
        }
    }
}

/// Reject base URLs that could never be requested
fn check_base_url(url: &str) -> Result<(), Error> {
    let parsed = Url::parse(url)
        .map_err(|e| Error::Configuration(format!("invalid base URL '{}': {}", url, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(Error::Configuration(format!(
            "unsupported scheme '{}' in base URL '{}'",
            other, url
        ))),
    }
}

/// Builder for constructing OpenAI providers
///
/// ```no_run
/// use parley_providers::builder::OpenAIBuilder;
///
/// let provider = OpenAIBuilder::new("sk-...")
///     .organization("org-...")
///     .build()
///     .unwrap();
/// ```
pub struct OpenAIBuilder {
    api_key: String,
    base_url: Option<String>,
    organization: Option<String>,
    model: Option<String>,
    timeout: Option<Duration>,
    client: Option<Arc<dyn HttpClient>>,
}

impl OpenAIBuilder {
    /// Create a new OpenAI builder with API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            organization: None,
            model: None,
            timeout: None,
            client: None,
        }
    }

    /// Set the base URL (for proxies and compatible servers)
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the organization ID
    pub fn organization(mut self, org: impl Into<String>) -> Self {
        self.organization = Some(org.into());
        self
    }

    /// Set the chat model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the HTTP timeout of the default client
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set a custom HTTP client
    pub fn with_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Build the OpenAI provider
    pub fn build(self) -> Result<OpenAI, Error> {
        let mut config = OpenAIConfig::new(self.api_key);

        if let Some(base_url) = self.base_url {
            check_base_url(&base_url)?;
            config = config.with_base_url(base_url);
        }
        if let Some(org) = self.organization {
            config = config.with_organization(org);
        }
        if let Some(model) = self.model {
            config = config.with_model(model);
        }

        let client = client_or_default(self.client, self.timeout)?;
        Ok(OpenAI::new(config, client))
    }
}

impl ProviderBuilder for OpenAIBuilder {
    type Provider = OpenAI;

    fn with_client(self, client: Arc<dyn HttpClient>) -> Self {
        OpenAIBuilder::with_client(self, client)
    }

    fn build(self) -> Result<Self::Provider, Error> {
        OpenAIBuilder::build(self)
    }
}

/// Builder for constructing Gemini providers
pub struct GeminiBuilder {
    api_key: String,
    base_url: Option<String>,
    model: Option<String>,
    timeout: Option<Duration>,
    pacer: Option<Arc<dyn Pacer>>,
    unit: ChunkUnit,
    client: Option<Arc<dyn HttpClient>>,
}

impl GeminiBuilder {
    /// Create a new Gemini builder with API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            model: None,
            timeout: None,
            pacer: None,
            unit: ChunkUnit::default(),
            client: None,
        }
    }

    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the HTTP timeout of the default client
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Fixed delay between simulated stream emits
    pub fn stream_delay(mut self, delay: Duration) -> Self {
        self.pacer = Some(Arc::new(FixedPacer(delay)));
        self
    }

    /// Custom pacing between simulated stream emits
    pub fn pacer(mut self, pacer: Arc<dyn Pacer>) -> Self {
        self.pacer = Some(pacer);
        self
    }

    /// Granularity of simulated stream chunks
    pub fn chunk_unit(mut self, unit: ChunkUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Set a custom HTTP client
    pub fn with_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Build the Gemini provider
    pub fn build(self) -> Result<Gemini, Error> {
        let mut config = GeminiConfig::new(self.api_key);

        if let Some(base_url) = self.base_url {
            check_base_url(&base_url)?;
            config = config.with_base_url(base_url);
        }
        if let Some(model) = self.model {
            config = config.with_model(model);
        }

        let client = client_or_default(self.client, self.timeout)?;
        let mut provider = Gemini::new(config, client).with_chunk_unit(self.unit);
        if let Some(pacer) = self.pacer {
            provider = provider.with_pacer(pacer);
        }
        Ok(provider)
    }
}

impl ProviderBuilder for GeminiBuilder {
    type Provider = Gemini;

    fn with_client(self, client: Arc<dyn HttpClient>) -> Self {
        GeminiBuilder::with_client(self, client)
    }

    fn build(self) -> Result<Self::Provider, Error> {
        GeminiBuilder::build(self)
    }
}
