//! Response parsing for OpenAI

use crate::error;
use crate::openai::provider::PROVIDER_NAME;
use crate::traits::{ResponseParser, StreamEventParser};
use parley_core::{CanonicalChunk, Error};
use serde::Deserialize;
use serde_json::Value;

/// Parses OpenAI responses
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAIParser;

impl ResponseParser for OpenAIParser {
    fn parse_text(&self, value: Value) -> Result<String, Error> {
        if let Some(message) = api_error_message(&value) {
            return Err(Error::signalled(PROVIDER_NAME, message));
        }

        let response: OpenAIResponse = serde_json::from_value(value)
            .map_err(|e| error::serialization_error(PROVIDER_NAME, e))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Error::malformed(PROVIDER_NAME, "no message content in response"))
    }
}

impl StreamEventParser for OpenAIParser {
    fn parse_event(&self, data: &str) -> Result<Option<CanonicalChunk>, Error> {
        let value: Value =
            serde_json::from_str(data).map_err(|e| error::serialization_error(PROVIDER_NAME, e))?;

        if let Some(message) = api_error_message(&value) {
            return Ok(Some(CanonicalChunk::error(message)));
        }

        let chunk: StreamChunk = serde_json::from_value(value)
            .map_err(|e| error::serialization_error(PROVIDER_NAME, e))?;

        Ok(chunk
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .filter(|content| !content.is_empty())
            .map(CanonicalChunk::content))
    }
}

/// In-band `{"error": {"message": ..}}` payload
fn api_error_message(value: &Value) -> Option<String> {
    let error = value.get("error")?;
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string());
    Some(message)
}

// Response structures
#[derive(Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageResponse,
}

#[derive(Deserialize)]
struct MessageResponse {
    content: Option<String>,
}

// Streaming structures
#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: DeltaContent,
}

#[derive(Deserialize, Default)]
struct DeltaContent {
    content: Option<String>,
}
