//! Gemini provider implementation
//!
//! Gemini is used through its one-shot `generateContent` endpoint only. A
//! streamed reply is produced by completing the request first and replaying
//! the text through a [`SimulatedStream`].

use crate::gemini::{config::GeminiConfig, converter::GeminiConverter, parser::GeminiParser};
use crate::http::{HttpClient, ReqwestClient};
use crate::pacing::{FixedPacer, Pacer};
use crate::simulated::{ChunkUnit, SimulatedStream};
use crate::traits::{RequestConverter, ResponseParser};
use async_trait::async_trait;
use futures::{stream, StreamExt};
use parley_core::{Capabilities, ChunkStream, Conversation, Error, ProviderClient};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use std::sync::Arc;
use tracing::debug;

pub(crate) const PROVIDER_NAME: &str = "gemini";

/// Google Gemini provider
///
/// # Example
///
/// ```no_run
/// use parley_providers::{Gemini, NoPacer};
/// use std::sync::Arc;
///
/// let provider = Gemini::with_api_key("your-api-key")
///     .unwrap()
///     .with_pacer(Arc::new(NoPacer));
/// ```
#[derive(Clone)]
pub struct Gemini {
    config: GeminiConfig,
    client: Arc<dyn HttpClient>,
    converter: GeminiConverter,
    parser: GeminiParser,
    pacer: Arc<dyn Pacer>,
    unit: ChunkUnit,
}

impl Gemini {
    /// Create a new Gemini provider with the given configuration and client
    pub fn new(config: GeminiConfig, client: Arc<dyn HttpClient>) -> Self {
        Self {
            converter: GeminiConverter::new(&config),
            config,
            client,
            parser: GeminiParser,
            pacer: Arc::new(FixedPacer::default()),
            unit: ChunkUnit::default(),
        }
    }

    /// Create a new Gemini provider with just an API key
    pub fn with_api_key(api_key: impl Into<String>) -> Result<Self, Error> {
        let client = Arc::new(ReqwestClient::new()?);
        Ok(Self::new(GeminiConfig::new(api_key), client))
    }

    /// Replace the wait between simulated stream emits
    pub fn with_pacer(mut self, pacer: Arc<dyn Pacer>) -> Self {
        self.pacer = pacer;
        self
    }

    /// Set the granularity of simulated stream chunks
    pub fn with_chunk_unit(mut self, unit: ChunkUnit) -> Self {
        self.unit = unit;
        self
    }

    /// The active configuration
    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn create_headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();

        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(&self.config.api_key)
                .map_err(|e| Error::Configuration(format!("Invalid API key: {}", e)))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(headers)
    }
}

#[async_trait]
impl ProviderClient for Gemini {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            native_streaming: false,
        }
    }

    async fn generate(&self, conversation: &Conversation) -> Result<String, Error> {
        let body = self.converter.convert(conversation)?;
        let headers = self.create_headers()?;
        debug!(
            provider = PROVIDER_NAME,
            model = %self.config.model,
            turns = conversation.len(),
            "sending generateContent request"
        );

        let value = self
            .client
            .post(&self.config.generate_url(), headers, body)
            .await
            .map_err(|e| e.into_core(PROVIDER_NAME))?;

        let text = self.parser.parse_text(value)?;
        debug!(provider = PROVIDER_NAME, length = text.len(), "received reply");
        Ok(text)
    }

    fn stream(&self, conversation: &Conversation) -> ChunkStream {
        let provider = self.clone();
        let conversation = conversation.clone();

        let completed = async move {
            let text = provider.generate(&conversation).await?;
            Ok::<_, Error>(SimulatedStream::new(&text, provider.unit, provider.pacer))
        };

        stream::once(completed)
            .map(|completed| match completed {
                Ok(simulated) => simulated.boxed(),
                Err(e) => stream::iter([Err(e)]).boxed(),
            })
            .flatten()
            .boxed()
    }
}
