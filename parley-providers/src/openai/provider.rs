//! OpenAI provider implementation
//!
//! Chat completions with native server-sent event streaming.

use crate::http::{create_headers, HttpClient, ReqwestClient};
use crate::openai::{
    config::OpenAIConfig, converter::OpenAIConverter, parser::OpenAIParser, stream::OpenAIStream,
};
use crate::traits::{RequestConverter, ResponseParser};
use async_trait::async_trait;
use futures::{stream, StreamExt};
use parley_core::{Capabilities, ChunkStream, Conversation, Error, ProviderClient};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

pub(crate) const PROVIDER_NAME: &str = "openai";

/// OpenAI provider for chat completions
///
/// # Example
///
/// ```no_run
/// use parley_providers::OpenAI;
///
/// let provider = OpenAI::with_api_key("your-api-key").unwrap();
///
/// // Or with custom configuration and client
/// use parley_providers::openai::OpenAIConfig;
/// use parley_providers::http::ReqwestClient;
/// use std::sync::Arc;
///
/// let config = OpenAIConfig::new("your-api-key").with_model("gpt-4o-mini");
/// let client = Arc::new(ReqwestClient::new().unwrap());
/// let provider = OpenAI::new(config, client);
/// ```
#[derive(Clone)]
pub struct OpenAI {
    client: Arc<dyn HttpClient>,
    config: OpenAIConfig,
    converter: OpenAIConverter,
    parser: OpenAIParser,
}

impl OpenAI {
    /// Create a new OpenAI provider with the given configuration and client
    pub fn new(config: OpenAIConfig, client: Arc<dyn HttpClient>) -> Self {
        Self {
            client,
            converter: OpenAIConverter::new(&config),
            config,
            parser: OpenAIParser,
        }
    }

    /// Create a new OpenAI provider with just an API key
    pub fn with_api_key(api_key: impl Into<String>) -> Result<Self, Error> {
        let client = Arc::new(ReqwestClient::new()?);
        Ok(Self::new(OpenAIConfig::new(api_key), client))
    }

    /// The active configuration
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    fn headers(&self) -> Result<HeaderMap, Error> {
        let mut additional = HeaderMap::new();
        if let Some(org) = &self.config.organization_id {
            additional.insert(
                "OpenAI-Organization",
                HeaderValue::from_str(org)
                    .map_err(|e| Error::Configuration(format!("Invalid organization: {}", e)))?,
            );
        }
        create_headers(&self.config.api_key, Some(additional))
    }

    fn request(
        &self,
        conversation: &Conversation,
        streaming: bool,
    ) -> Result<(Value, HeaderMap), Error> {
        let mut body = self.converter.convert(conversation)?;
        body["stream"] = json!(streaming);
        Ok((body, self.headers()?))
    }
}

#[async_trait]
impl ProviderClient for OpenAI {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            native_streaming: true,
        }
    }

    async fn generate(&self, conversation: &Conversation) -> Result<String, Error> {
        let (body, headers) = self.request(conversation, false)?;
        debug!(
            provider = PROVIDER_NAME,
            model = %self.config.model,
            turns = conversation.len(),
            "sending completion request"
        );

        let value = self
            .client
            .post(&self.config.chat_url(), headers, body)
            .await
            .map_err(|e| e.into_core(PROVIDER_NAME))?;

        self.parser.parse_text(value)
    }

    fn stream(&self, conversation: &Conversation) -> ChunkStream {
        let request = self.request(conversation, true);
        let client = Arc::clone(&self.client);
        let url = self.config.chat_url();
        let model = self.config.model.clone();
        let turns = conversation.len();

        // nothing is sent until the first poll
        let opened = async move {
            let (body, headers) = request?;
            debug!(provider = PROVIDER_NAME, model = %model, turns, "opening completion stream");
            client
                .post_stream(&url, headers, body)
                .await
                .map_err(|e| e.into_core(PROVIDER_NAME))
        };

        stream::once(opened)
            .map(|opened| match opened {
                Ok(body) => OpenAIStream::new(body).boxed(),
                Err(e) => stream::iter([Err(e)]).boxed(),
            })
            .flatten()
            .boxed()
    }
}
