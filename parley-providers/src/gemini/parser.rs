//! Gemini response parsing

use crate::error;
use crate::gemini::converter::GeminiResponse;
use crate::gemini::provider::PROVIDER_NAME;
use crate::traits::ResponseParser;
use parley_core::Error;
use serde_json::Value;

/// Parser implementation for Gemini
#[derive(Debug, Clone, Copy, Default)]
pub struct GeminiParser;

impl ResponseParser for GeminiParser {
    fn parse_text(&self, value: Value) -> Result<String, Error> {
        if let Some(error) = value.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            return Err(Error::signalled(PROVIDER_NAME, message));
        }

        let response: GeminiResponse = serde_json::from_value(value)
            .map_err(|e| error::serialization_error(PROVIDER_NAME, e))?;

        let Some(candidate) = response.candidates.into_iter().next() else {
            if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
                return Err(Error::signalled(
                    PROVIDER_NAME,
                    format!("prompt blocked: {}", reason),
                ));
            }
            return Err(Error::malformed(PROVIDER_NAME, "no candidates in response"));
        };

        let texts: Vec<String> = candidate
            .content
            .map(|content| content.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|part| part.text)
            .collect();

        if texts.is_empty() {
            return Err(Error::malformed(PROVIDER_NAME, "no text in first candidate"));
        }
        Ok(texts.concat())
    }
}
