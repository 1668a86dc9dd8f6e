//! Conversion between Parley conversations and Gemini API types

use crate::constants::GEMINI_EMPTY_PROMPT;
use crate::gemini::config::GeminiConfig;
use crate::gemini::provider::PROVIDER_NAME;
use crate::traits::RequestConverter;
use parley_core::{Conversation, Error, Role};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// Gemini API request types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<GeminiContent>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationConfig {
    pub temperature: f64,
    pub max_output_tokens: u32,
    pub top_p: f64,
    pub top_k: u32,
}

// Gemini API response types
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeminiCandidate {
    pub content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PromptFeedback {
    pub block_reason: Option<String>,
}

impl GeminiPart {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

/// Converts conversations to the `generateContent` format
///
/// User turns keep the `user` role and assistant turns become `model`.
/// Adjacent turns that map to the same role share one entry. System turns are
/// lifted into `systemInstruction`.
#[derive(Debug, Clone)]
pub struct GeminiConverter {
    temperature: f64,
    max_output_tokens: u32,
    top_p: f64,
    top_k: u32,
}

impl GeminiConverter {
    /// Converter using the sampling settings of `config`
    pub fn new(config: &GeminiConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
            top_p: config.top_p,
            top_k: config.top_k,
        }
    }

    pub(crate) fn build_request(&self, conversation: &Conversation) -> GeminiRequest {
        let mut contents: Vec<GeminiContent> = Vec::new();
        let mut system_parts = Vec::new();

        for turn in conversation.turns() {
            let role = match turn.role {
                Role::System => {
                    system_parts.push(GeminiPart::text(turn.content.as_str()));
                    continue;
                }
                Role::User => "user",
                Role::Assistant => "model",
            };

            match contents.last_mut() {
                Some(last) if last.role.as_deref() == Some(role) => {
                    last.parts.push(GeminiPart::text(turn.content.as_str()));
                }
                _ => contents.push(GeminiContent {
                    role: Some(role.to_string()),
                    parts: vec![GeminiPart::text(turn.content.as_str())],
                }),
            }
        }

        if contents.is_empty() {
            contents.push(GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart::text(GEMINI_EMPTY_PROMPT)],
            });
        }

        let system_instruction = (!system_parts.is_empty()).then(|| GeminiContent {
            role: None,
            parts: system_parts,
        });

        GeminiRequest {
            contents,
            system_instruction,
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
                top_p: self.top_p,
                top_k: self.top_k,
            },
        }
    }
}

impl RequestConverter for GeminiConverter {
    fn convert(&self, conversation: &Conversation) -> Result<Value, Error> {
        serde_json::to_value(self.build_request(conversation))
            .map_err(|e| Error::malformed(PROVIDER_NAME, format!("failed to encode request: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::Turn;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn converter() -> GeminiConverter {
        GeminiConverter::new(&GeminiConfig::new("g"))
    }

    #[test]
    fn test_merges_adjacent_roles() {
        let conversation = Conversation::new()
            .with_turn(Turn::user("a"))
            .with_turn(Turn::user("b"))
            .with_turn(Turn::assistant("c"))
            .with_turn(Turn::user("d"));

        let body = converter().convert(&conversation).unwrap();
        assert_eq!(
            body["contents"],
            json!([
                {"role": "user", "parts": [{"text": "a"}, {"text": "b"}]},
                {"role": "model", "parts": [{"text": "c"}]},
                {"role": "user", "parts": [{"text": "d"}]},
            ])
        );
        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn test_system_turns_become_instruction() {
        let conversation = Conversation::new()
            .with_turn(Turn::system("be brief"))
            .with_turn(Turn::user("hi"))
            .with_turn(Turn::system("no emoji"));

        let body = converter().convert(&conversation).unwrap();
        assert_eq!(
            body["systemInstruction"],
            json!({"parts": [{"text": "be brief"}, {"text": "no emoji"}]})
        );
        assert_eq!(
            body["contents"],
            json!([{"role": "user", "parts": [{"text": "hi"}]}])
        );
    }

    #[test]
    fn test_empty_conversation_sends_default_prompt() {
        let body = converter().convert(&Conversation::new()).unwrap();
        assert_eq!(
            body["contents"],
            json!([{"role": "user", "parts": [{"text": "Hello"}]}])
        );
    }

    #[test]
    fn test_generation_config() {
        let body = converter().convert(&Conversation::new()).unwrap();
        assert_eq!(
            body["generationConfig"],
            json!({
                "temperature": 0.7,
                "maxOutputTokens": 1000,
                "topP": 0.95,
                "topK": 40,
            })
        );
    }
}
